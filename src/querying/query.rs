//! Query AST: triple patterns grouped into required and optional groups, plus a
//! projection. Text queries are parsed into this once; programmatic callers build
//! it directly with [`QueryBuilder`].

use std::collections::HashSet;
use std::fmt;

use crate::core::{Iri, Literal, Term};
use crate::error::{CatalogError, Result};

/// A named placeholder, stored without its `?` sigil.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        Self(name.trim_start_matches(['?', '$']).to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

/// Shorthand for `Variable::new`.
pub fn var(name: &str) -> Variable {
    Variable::new(name)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatternTerm {
    Variable(Variable),
    Constant(Term),
}

impl PatternTerm {
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            PatternTerm::Variable(v) => Some(v),
            PatternTerm::Constant(_) => None,
        }
    }
}

impl From<Variable> for PatternTerm {
    fn from(v: Variable) -> Self {
        PatternTerm::Variable(v)
    }
}

impl From<Term> for PatternTerm {
    fn from(term: Term) -> Self {
        PatternTerm::Constant(term)
    }
}

impl From<Iri> for PatternTerm {
    fn from(iri: Iri) -> Self {
        PatternTerm::Constant(Term::Iri(iri))
    }
}

impl From<Literal> for PatternTerm {
    fn from(literal: Literal) -> Self {
        PatternTerm::Constant(Term::Literal(literal))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

impl TriplePattern {
    pub fn new(
        subject: impl Into<PatternTerm>,
        predicate: impl Into<PatternTerm>,
        object: impl Into<PatternTerm>,
    ) -> Self {
        Self { subject: subject.into(), predicate: predicate.into(), object: object.into() }
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        [&self.subject, &self.predicate, &self.object].into_iter().filter_map(PatternTerm::as_variable)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    /// Inner join: a row with no match is dropped
    Required,
    /// Left outer join: a row with no match is kept unextended
    Optional,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternGroup {
    pub kind: GroupKind,
    pub patterns: Vec<TriplePattern>,
}

impl PatternGroup {
    pub fn required(patterns: impl IntoIterator<Item = TriplePattern>) -> Self {
        Self { kind: GroupKind::Required, patterns: patterns.into_iter().collect() }
    }

    pub fn optional(patterns: impl IntoIterator<Item = TriplePattern>) -> Self {
        Self { kind: GroupKind::Optional, patterns: patterns.into_iter().collect() }
    }

    pub fn is_optional(&self) -> bool {
        self.kind == GroupKind::Optional
    }
}

/// A validated query. Construct through [`Query::new`] or [`QueryBuilder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    groups: Vec<PatternGroup>,
    projection: Vec<Variable>,
    distinct: bool,
    limit: Option<usize>,
}

impl Query {
    /// Checks the structure and that every projected variable occurs in a pattern.
    pub fn new(groups: Vec<PatternGroup>, projection: Vec<Variable>) -> Result<Self> {
        if projection.is_empty() {
            return Err(CatalogError::QuerySyntax("projection is empty".to_string()));
        }
        for (index, group) in groups.iter().enumerate() {
            if group.patterns.is_empty() {
                return Err(CatalogError::QuerySyntax(format!("pattern group {} is empty", index + 1)));
            }
            for pattern in &group.patterns {
                for (position, term) in [("subject", &pattern.subject), ("predicate", &pattern.predicate)] {
                    if let PatternTerm::Constant(Term::Literal(literal)) = term {
                        return Err(CatalogError::QuerySyntax(format!(
                            "literal \"{}\" cannot appear in {} position",
                            literal.lexical_form(),
                            position
                        )));
                    }
                }
            }
        }
        let mentioned: HashSet<&Variable> =
            groups.iter().flat_map(|g| &g.patterns).flat_map(TriplePattern::variables).collect();
        if let Some(unbound) = projection.iter().find(|v| !mentioned.contains(v)) {
            return Err(CatalogError::UnboundProjectionVariable(unbound.name().to_string()));
        }
        Ok(Self { groups, projection, distinct: false, limit: None })
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn groups(&self) -> &[PatternGroup] {
        &self.groups
    }

    pub fn projection(&self) -> &[Variable] {
        &self.projection
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// All variables in order of first appearance across the groups.
    pub fn variables(&self) -> Vec<Variable> {
        variables_in(&self.groups)
    }

    pub fn pattern_count(&self) -> usize {
        self.groups.iter().map(|g| g.patterns.len()).sum()
    }
}

pub(crate) fn variables_in(groups: &[PatternGroup]) -> Vec<Variable> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .flat_map(|g| &g.patterns)
        .flat_map(TriplePattern::variables)
        .filter(|v| seen.insert(*v))
        .cloned()
        .collect()
}

/// Incremental construction of a [`Query`].
///
/// Consecutive [`QueryBuilder::pattern`] calls share one required group;
/// each [`QueryBuilder::optional`] call adds its own optional group.
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    groups: Vec<PatternGroup>,
    projection: Vec<Variable>,
    distinct: bool,
    limit: Option<usize>,
}

impl QueryBuilder {
    pub fn pattern(
        mut self,
        subject: impl Into<PatternTerm>,
        predicate: impl Into<PatternTerm>,
        object: impl Into<PatternTerm>,
    ) -> Self {
        let pattern = TriplePattern::new(subject, predicate, object);
        match self.groups.last_mut() {
            Some(group) if !group.is_optional() => group.patterns.push(pattern),
            _ => self.groups.push(PatternGroup::required([pattern])),
        }
        self
    }

    pub fn optional(mut self, patterns: impl IntoIterator<Item = TriplePattern>) -> Self {
        self.groups.push(PatternGroup::optional(patterns));
        self
    }

    pub fn optional_pattern(
        self,
        subject: impl Into<PatternTerm>,
        predicate: impl Into<PatternTerm>,
        object: impl Into<PatternTerm>,
    ) -> Self {
        self.optional([TriplePattern::new(subject, predicate, object)])
    }

    pub fn select<I, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Variable>,
    {
        self.projection.extend(variables.into_iter().map(Into::into));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<Query> {
        Ok(Query::new(self.groups, self.projection)?
            .with_distinct(self.distinct)
            .with_limit(self.limit))
    }
}
