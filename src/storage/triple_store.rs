//! In-memory triple store with subject, predicate and object indexes.
//!
//! Statements are dictionary-encoded into `[u32; 3]` keys. The full statement set
//! and each of the three position indexes always hold exactly the same keys.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::{Iri, Statement, Term};
use crate::storage::indexing::dictionary::Dictionary;

type EncodedTriple = [u32; 3];

const SUBJECT: usize = 0;
const PREDICATE: usize = 1;
const OBJECT: usize = 2;

#[derive(Debug, Default, Clone)]
struct PositionIndex {
    position: usize,
    entries: HashMap<u32, BTreeSet<EncodedTriple>>,
}

impl PositionIndex {
    fn new(position: usize) -> Self {
        Self { position, entries: HashMap::new() }
    }

    fn insert(&mut self, triple: EncodedTriple) {
        self.entries.entry(triple[self.position]).or_default().insert(triple);
    }

    fn remove(&mut self, triple: &EncodedTriple) {
        let key = triple[self.position];
        if let Some(bucket) = self.entries.get_mut(&key) {
            bucket.remove(triple);
            if bucket.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    fn iter(&self, key: u32) -> impl Iterator<Item = &EncodedTriple> {
        self.entries.get(&key).into_iter().flatten()
    }
}

/// An indexed set of statements. Duplicate insertion is a no-op.
#[derive(Debug, Clone)]
pub struct TripleStore {
    dictionary: Dictionary,
    triples: BTreeSet<EncodedTriple>,
    by_subject: PositionIndex,
    by_predicate: PositionIndex,
    by_object: PositionIndex,
}

impl Default for TripleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TripleStore {
    pub fn new() -> Self {
        Self {
            dictionary: Dictionary::new(),
            triples: BTreeSet::new(),
            by_subject: PositionIndex::new(SUBJECT),
            by_predicate: PositionIndex::new(PREDICATE),
            by_object: PositionIndex::new(OBJECT),
        }
    }

    /// Adds the triple if absent. Returns `true` when the set changed.
    pub fn insert(&mut self, subject: Iri, predicate: Iri, object: impl Into<Term>) -> bool {
        let triple = [
            self.dictionary.encode(&Term::Iri(subject)),
            self.dictionary.encode(&Term::Iri(predicate)),
            self.dictionary.encode(&object.into()),
        ];
        if !self.triples.insert(triple) {
            return false;
        }
        for id in triple {
            self.dictionary.acquire(id);
        }
        self.by_subject.insert(triple);
        self.by_predicate.insert(triple);
        self.by_object.insert(triple);
        true
    }

    pub fn insert_statement(&mut self, statement: Statement) -> bool {
        self.insert(
            statement.subject().clone(),
            statement.predicate().clone(),
            statement.object().clone(),
        )
    }

    /// Removes the triple if present. Returns `true` when the set changed.
    pub fn remove(&mut self, subject: &Iri, predicate: &Iri, object: &Term) -> bool {
        let Some(triple) = self.encode_existing(subject, predicate, object) else {
            return false;
        };
        if !self.triples.remove(&triple) {
            return false;
        }
        self.by_subject.remove(&triple);
        self.by_predicate.remove(&triple);
        self.by_object.remove(&triple);
        for id in triple {
            self.dictionary.release(id);
        }
        true
    }

    pub fn remove_statement(&mut self, statement: &Statement) -> bool {
        self.remove(statement.subject(), statement.predicate(), statement.object())
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.encode_existing(statement.subject(), statement.predicate(), statement.object())
            .is_some_and(|triple| self.triples.contains(&triple))
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Distinct terms still referenced by some statement.
    pub fn term_count(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Statement> + '_ {
        self.triples.iter().filter_map(|triple| self.decode(triple))
    }

    /// Every statement agreeing with all bound positions; `None` is a wildcard.
    ///
    /// Candidates come from the subject index when the subject is bound, else the
    /// predicate index, else the object index. Only a fully unbound pattern scans.
    pub fn match_pattern<'a>(
        &'a self,
        subject: Option<&Iri>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
    ) -> impl Iterator<Item = Statement> + 'a {
        let pattern = self.encode_pattern(subject, predicate, object);
        let candidates: Box<dyn Iterator<Item = &'a EncodedTriple> + 'a> = match pattern {
            None => Box::new(std::iter::empty()),
            Some([Some(s), _, _]) => Box::new(self.by_subject.iter(s)),
            Some([None, Some(p), _]) => Box::new(self.by_predicate.iter(p)),
            Some([None, None, Some(o)]) => Box::new(self.by_object.iter(o)),
            Some([None, None, None]) => Box::new(self.triples.iter()),
        };
        let pattern = pattern.unwrap_or_default();
        candidates
            .filter(move |triple| {
                pattern.iter().zip(triple.iter()).all(|(bound, id)| bound.map_or(true, |b| b == *id))
            })
            .filter_map(move |triple| self.decode(triple))
    }

    /// Subjects `s` for which `(s, rdf:type, class)` holds.
    pub fn subjects_of_type<'a>(&'a self, class: &Iri) -> impl Iterator<Item = Iri> + 'a {
        let rdf_type = crate::core::vocab::rdf_type();
        let class = Term::Iri(class.clone());
        self.match_pattern(None, Some(&rdf_type), Some(&class))
            .map(|statement| statement.subject().clone())
    }

    /// The object of `(subject, predicate, ?)`.
    ///
    /// When the predicate is multi-valued this returns the first match in index
    /// order; callers needing every value use [`TripleStore::match_pattern`].
    pub fn value_of(&self, subject: &Iri, predicate: &Iri) -> Option<Term> {
        self.match_pattern(Some(subject), Some(predicate), None)
            .next()
            .map(|statement| statement.object().clone())
    }

    fn encode_existing(&self, subject: &Iri, predicate: &Iri, object: &Term) -> Option<EncodedTriple> {
        Some([
            self.dictionary.lookup(&Term::Iri(subject.clone()))?,
            self.dictionary.lookup(&Term::Iri(predicate.clone()))?,
            self.dictionary.lookup(object)?,
        ])
    }

    /// `None` when a bound term was never interned, so nothing can match.
    fn encode_pattern(
        &self,
        subject: Option<&Iri>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
    ) -> Option<[Option<u32>; 3]> {
        let subject = match subject {
            Some(iri) => Some(self.dictionary.lookup(&Term::Iri(iri.clone()))?),
            None => None,
        };
        let predicate = match predicate {
            Some(iri) => Some(self.dictionary.lookup(&Term::Iri(iri.clone()))?),
            None => None,
        };
        let object = match object {
            Some(term) => Some(self.dictionary.lookup(term)?),
            None => None,
        };
        Some([subject, predicate, object])
    }

    fn decode(&self, triple: &EncodedTriple) -> Option<Statement> {
        let subject = self.dictionary.decode(triple[SUBJECT])?.as_iri()?.clone();
        let predicate = self.dictionary.decode(triple[PREDICATE])?.as_iri()?.clone();
        let object = self.dictionary.decode(triple[OBJECT])?.clone();
        Some(Statement::new(subject, predicate, object))
    }

    #[cfg(test)]
    fn indexes_agree(&self) -> bool {
        let collect = |index: &PositionIndex| -> BTreeSet<EncodedTriple> {
            index.entries.values().flatten().copied().collect()
        };
        collect(&self.by_subject) == self.triples
            && collect(&self.by_predicate) == self.triples
            && collect(&self.by_object) == self.triples
    }
}

impl Extend<Statement> for TripleStore {
    fn extend<I: IntoIterator<Item = Statement>>(&mut self, iter: I) {
        for statement in iter {
            self.insert_statement(statement);
        }
    }
}

impl FromIterator<Statement> for TripleStore {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        let mut store = TripleStore::new();
        store.extend(iter);
        store
    }
}

/// Set equality over statements; dictionary ids and insertion history are ignored.
impl PartialEq for TripleStore {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().collect::<HashSet<_>>() == other.iter().collect::<HashSet<_>>()
    }
}

impl Eq for TripleStore {}
