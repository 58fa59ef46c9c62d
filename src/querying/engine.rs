//! Pattern query evaluation.
//!
//! A left-deep nested-loop join: every required group is applied first, in listed
//! order, with inner-join semantics; then every optional group, in listed order,
//! with left-outer semantics. Rows are slot vectors indexed by variable position
//! so a binding lookup is a plain index.

use std::collections::HashSet;
use std::error::Error;

use tracing::debug;

use crate::core::{Iri, Term};
use crate::error::{CatalogError, Result};
use crate::parsing::query_parser::parse_query;
use crate::querying::query::{PatternGroup, PatternTerm, Query, TriplePattern, Variable};
use crate::querying::results::ResultTable;
use crate::storage::TripleStore;

/// Evaluates queries against a store.
pub trait QueryEngine {
    type EngineError: Error + 'static;

    fn evaluate(&self, query: &Query, store: &TripleStore) -> std::result::Result<ResultTable, Self::EngineError>;

    /// Parses `query` text and evaluates it.
    fn execute_query(&self, query: &str, store: &TripleStore) -> std::result::Result<ResultTable, Self::EngineError>;
}

type Row = Vec<Option<Term>>;

#[derive(Debug, Clone)]
enum Slot {
    Constant(Term),
    Variable(usize),
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    positions: [Slot; 3],
}

/// The built-in engine over [`TripleStore::match_pattern`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternQueryEngine;

impl PatternQueryEngine {
    pub fn new() -> Self {
        PatternQueryEngine
    }

    fn compile_group(group: &PatternGroup, variables: &[Variable]) -> Result<Vec<CompiledPattern>> {
        group.patterns.iter().map(|pattern| Self::compile_pattern(pattern, variables)).collect()
    }

    fn compile_pattern(pattern: &TriplePattern, variables: &[Variable]) -> Result<CompiledPattern> {
        let slot = |term: &PatternTerm| -> Result<Slot> {
            match term {
                PatternTerm::Constant(value) => Ok(Slot::Constant(value.clone())),
                PatternTerm::Variable(v) => slot_of(v, variables).map(Slot::Variable),
            }
        };
        Ok(CompiledPattern {
            positions: [slot(&pattern.subject)?, slot(&pattern.predicate)?, slot(&pattern.object)?],
        })
    }
}

fn slot_of(variable: &Variable, variables: &[Variable]) -> Result<usize> {
    variables
        .iter()
        .position(|v| v == variable)
        .ok_or_else(|| CatalogError::UnboundProjectionVariable(variable.name().to_string()))
}

impl QueryEngine for PatternQueryEngine {
    type EngineError = CatalogError;

    fn evaluate(&self, query: &Query, store: &TripleStore) -> Result<ResultTable> {
        let variables = query.variables();
        let mut required = Vec::new();
        let mut optional = Vec::new();
        for group in query.groups() {
            let compiled = Self::compile_group(group, &variables)?;
            if group.is_optional() {
                optional.push(compiled);
            } else {
                required.extend(compiled);
            }
        }

        let mut rows: Vec<Row> = vec![vec![None; variables.len()]];
        for pattern in &required {
            rows = rows.iter().flat_map(|row| extend_row(store, pattern, row)).collect();
            if rows.is_empty() {
                break;
            }
        }

        for group in &optional {
            let mut next = Vec::with_capacity(rows.len());
            for row in rows {
                let extended = extend_group(store, group, &row);
                if extended.is_empty() {
                    next.push(row);
                } else {
                    next.extend(extended);
                }
            }
            rows = next;
        }

        let projection = query
            .projection()
            .iter()
            .map(|v| slot_of(v, &variables))
            .collect::<Result<Vec<_>>>()?;
        let mut projected: Vec<Vec<Option<Term>>> = rows
            .into_iter()
            .map(|row| projection.iter().map(|&slot| row[slot].clone()).collect())
            .collect();
        if query.is_distinct() {
            let mut seen = HashSet::new();
            projected.retain(|row| seen.insert(row.clone()));
        }
        if let Some(limit) = query.limit() {
            projected.truncate(limit);
        }

        let columns = query.projection().iter().map(|v| v.name().to_string()).collect();
        let table = ResultTable::from_terms(columns, projected);
        debug!(patterns = query.pattern_count(), rows = table.len(), "Evaluated query");
        Ok(table)
    }

    fn execute_query(&self, query: &str, store: &TripleStore) -> Result<ResultTable> {
        let query = parse_query(query)?;
        self.evaluate(&query, store)
    }
}

/// Applies every pattern of an optional group to one row.
fn extend_group(store: &TripleStore, group: &[CompiledPattern], row: &Row) -> Vec<Row> {
    let mut rows = vec![row.clone()];
    for pattern in group {
        rows = rows.iter().flat_map(|r| extend_row(store, pattern, r)).collect();
        if rows.is_empty() {
            break;
        }
    }
    rows
}

/// Every extension of `row` by a statement matching `pattern` under the row's
/// existing bindings. Empty when nothing matches.
fn extend_row(store: &TripleStore, pattern: &CompiledPattern, row: &Row) -> Vec<Row> {
    let [subject, predicate, object] = pattern.positions.each_ref().map(|slot| match slot {
        Slot::Constant(term) => Some(term),
        Slot::Variable(index) => row[*index].as_ref(),
    });
    // a literal bound into subject or predicate position can never match
    let Some(subject) = as_iri_position(subject) else {
        return Vec::new();
    };
    let Some(predicate) = as_iri_position(predicate) else {
        return Vec::new();
    };

    store
        .match_pattern(subject, predicate, object)
        .filter_map(|statement| {
            let values = [
                Term::Iri(statement.subject().clone()),
                Term::Iri(statement.predicate().clone()),
                statement.object().clone(),
            ];
            let mut extended = row.clone();
            for (slot, value) in pattern.positions.iter().zip(values) {
                if let Slot::Variable(index) = slot {
                    match &extended[*index] {
                        Some(existing) if *existing != value => return None,
                        Some(_) => {}
                        None => extended[*index] = Some(value),
                    }
                }
            }
            Some(extended)
        })
        .collect()
}

/// `Some(None)` for an unbound position, `Some(Some(iri))` for a bound IRI and
/// `None` when the bound value is a literal.
fn as_iri_position(value: Option<&Term>) -> Option<Option<&Iri>> {
    match value {
        None => Some(None),
        Some(Term::Iri(iri)) => Some(Some(iri)),
        Some(Term::Literal(_)) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocab::{self, ex};
    use crate::core::Literal;
    use crate::querying::query::var;

    fn brand_store() -> TripleStore {
        let mut store = TripleStore::new();
        store.insert(ex("prodA"), ex(vocab::HAS_BRAND), ex("brandX"));
        store.insert(ex("prodB"), ex(vocab::HAS_BRAND), ex("brandY"));
        store.insert(ex("prodA"), vocab::label(), Literal::string("Product A"));
        store
    }

    #[test]
    fn test_shared_variable_joins() {
        let query = Query::builder()
            .pattern(var("p"), ex(vocab::HAS_BRAND), var("b"))
            .pattern(var("p"), vocab::label(), var("l"))
            .select(["p", "b", "l"])
            .build()
            .unwrap();
        let table = PatternQueryEngine.evaluate(&query, &brand_store()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "b"), Some(ex("brandX").as_str()));
        assert_eq!(table.get(0, "l"), Some("Product A"));
    }

    #[test]
    fn test_repeated_variable_within_pattern() {
        let mut store = brand_store();
        store.insert(ex("loop"), ex(vocab::HAS_BRAND), ex("loop"));
        let query = Query::builder()
            .pattern(var("x"), ex(vocab::HAS_BRAND), var("x"))
            .select(["x"])
            .build()
            .unwrap();
        let table = PatternQueryEngine.evaluate(&query, &store).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "x"), Some(ex("loop").as_str()));
    }

    #[test]
    fn test_literal_bound_into_subject_position_matches_nothing() {
        let query = Query::builder()
            .pattern(var("p"), vocab::label(), var("l"))
            .pattern(var("l"), var("q"), var("o"))
            .select(["p"])
            .build()
            .unwrap();
        let table = PatternQueryEngine.evaluate(&query, &brand_store()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["p"]);
    }

    #[test]
    fn test_partial_optional_group_leaves_row_unextended() {
        // both patterns of the group must match for the group to extend the row
        let query = Query::builder()
            .pattern(var("p"), ex(vocab::HAS_BRAND), var("b"))
            .optional([
                TriplePattern::new(var("p"), vocab::label(), var("l")),
                TriplePattern::new(var("p"), ex(vocab::HAS_PRICE), var("price")),
            ])
            .select(["p", "l", "price"])
            .build()
            .unwrap();
        let table = PatternQueryEngine.evaluate(&query, &brand_store()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows.iter().all(|row| row[1].is_none() && row[2].is_none()));
    }

    #[test]
    fn test_distinct_and_limit() {
        let query = Query::builder()
            .pattern(var("p"), var("pred"), var("o"))
            .select(["p"])
            .distinct()
            .build()
            .unwrap();
        let table = PatternQueryEngine.evaluate(&query, &brand_store()).unwrap();
        assert_eq!(table.len(), 2);

        let limited = PatternQueryEngine
            .execute_query("SELECT ?p WHERE { ?p ?pred ?o } LIMIT 1", &brand_store())
            .unwrap();
        assert_eq!(limited.len(), 1);
    }
}
