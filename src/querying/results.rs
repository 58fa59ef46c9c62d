use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Term;

/// A query result: ordered column names plus rows of optional cells.
///
/// Columns always come from the projection, so an empty result still carries its
/// headers. IRIs render as the full IRI and literals as their lexical form; an
/// unbound cell is `None` (`null` in JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn from_terms(columns: Vec<String>, rows: Vec<Vec<Option<Term>>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.map(|term| term.to_string())).collect())
            .collect();
        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// The cell at `row` in `column`; `None` when unbound or out of range.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// One map per row holding only the bound cells.
    pub fn to_bindings(&self) -> Vec<HashMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .filter_map(|(column, cell)| cell.as_ref().map(|value| (column.clone(), value.clone())))
                    .collect()
            })
            .collect()
    }

    /// Tab-separated text with a header row; unbound cells are empty.
    pub fn to_tsv(&self) -> String {
        let mut out = self.columns.join("\t");
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> =
                row.iter().map(|cell| cell.as_deref().map(sanitize).unwrap_or_default()).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out
    }
}

fn sanitize(cell: &str) -> String {
    cell.replace(['\t', '\n', '\r'], " ")
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tsv())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Iri, Literal};

    fn sample() -> ResultTable {
        ResultTable::from_terms(
            vec!["order".into(), "total".into()],
            vec![
                vec![
                    Some(Term::Iri(Iri::new("http://example.org/gadgetstore#o1"))),
                    Some(Term::Literal(Literal::decimal("250.00").unwrap())),
                ],
                vec![Some(Term::Iri(Iri::new("http://example.org/gadgetstore#o2"))), None],
            ],
        )
    }

    #[test]
    fn test_cells_render_full_iri_and_lexical_form() {
        let table = sample();
        assert_eq!(table.get(0, "order"), Some("http://example.org/gadgetstore#o1"));
        assert_eq!(table.get(0, "total"), Some("250.00"));
        assert_eq!(table.get(1, "total"), None);
        assert_eq!(table.get(0, "missing"), None);
    }

    #[test]
    fn test_tsv_and_json_rendering() {
        let table = sample();
        assert_eq!(
            table.to_tsv(),
            "order\ttotal\nhttp://example.org/gadgetstore#o1\t250.00\nhttp://example.org/gadgetstore#o2\t\n"
        );
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["rows"][1][1], serde_json::Value::Null);
    }

    #[test]
    fn test_bindings_skip_unbound_cells() {
        let bindings = sample().to_bindings();
        assert_eq!(bindings[0].len(), 2);
        assert_eq!(bindings[1].len(), 1);
        assert!(!bindings[1].contains_key("total"));
    }

    #[test]
    fn test_empty_table_keeps_headers() {
        let table = ResultTable::new(vec!["x".into(), "y".into()]);
        assert!(table.is_empty());
        assert_eq!(table.to_tsv(), "x\ty\n");
    }
}
