use std::collections::HashMap;

use crate::core::Term;

/// Interns terms to dense `u32` ids so the store's indexes hold fixed-size keys.
///
/// Each id carries a count of the statement positions that hold it. When the count
/// drops to zero through [`Dictionary::release`] the term is forgotten and its id
/// is handed out again by the next [`Dictionary::encode`] of a new term.
#[derive(Debug, Default, Clone)]
pub struct Dictionary {
    term_to_id: HashMap<Term, u32>,
    id_to_term: Vec<Option<Term>>,
    refs: Vec<u32>,
    free: Vec<u32>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    /// Returns the id of `term`, interning it with a zero count if unseen.
    pub fn encode(&mut self, term: &Term) -> u32 {
        if let Some(&id) = self.term_to_id.get(term) {
            return id;
        }
        let id = match self.free.pop() {
            Some(id) => {
                self.id_to_term[id as usize] = Some(term.clone());
                id
            }
            None => {
                self.id_to_term.push(Some(term.clone()));
                self.refs.push(0);
                (self.id_to_term.len() - 1) as u32
            }
        };
        self.term_to_id.insert(term.clone(), id);
        id
    }

    /// Looks a term up without interning it.
    pub fn lookup(&self, term: &Term) -> Option<u32> {
        self.term_to_id.get(term).copied()
    }

    pub fn decode(&self, id: u32) -> Option<&Term> {
        self.id_to_term.get(id as usize)?.as_ref()
    }

    pub fn acquire(&mut self, id: u32) {
        if let Some(count) = self.refs.get_mut(id as usize) {
            *count += 1;
        }
    }

    /// Drops one reference; the last one frees the id.
    pub fn release(&mut self, id: u32) {
        let Some(count) = self.refs.get_mut(id as usize) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            if let Some(term) = self.id_to_term[id as usize].take() {
                self.term_to_id.remove(&term);
                self.free.push(id);
            }
        }
    }

    /// Number of live terms.
    pub fn len(&self) -> usize {
        self.term_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.term_to_id.is_empty()
    }
}
