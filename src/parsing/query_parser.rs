//! Parser for the textual pattern query syntax.
//!
//! ```text
//! PREFIX ex: <http://example.org/gadgetstore#>
//! SELECT ?order ?total WHERE {
//!   ?order a ex:Order ; ex:purchasedBy ?customer .
//!   OPTIONAL { ?order ex:totalPrice ?total }
//! } LIMIT 10
//! ```
//!
//! Text is parsed as SPARQL by `spargebra` and the algebra is lowered into a
//! [`Query`]. Only basic graph patterns, non-nested OPTIONAL blocks, DISTINCT and
//! LIMIT have a counterpart; any other well-formed construct is a `QuerySyntax`
//! error. The `ex:`, `foaf:`, `rdf:`, `rdfs:` and `xsd:` prefixes are pre-bound,
//! so the built-in queries parse with or without their declarations.

use std::sync::OnceLock;

use regex::Regex;
use spargebra::algebra::GraphPattern;
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern as SparqlTriplePattern};
use spargebra::Query as SparqlQuery;

use crate::core::vocab::DEFAULT_PREFIXES;
use crate::core::{Iri, Literal, Term};
use crate::error::{CatalogError, Result};
use crate::querying::query::{variables_in, PatternGroup, PatternTerm, Query, TriplePattern, Variable};

/// Parses query text into a validated [`Query`].
pub fn parse_query(text: &str) -> Result<Query> {
    let prologue: String =
        DEFAULT_PREFIXES.iter().map(|(prefix, namespace)| format!("PREFIX {}: <{}>\n", prefix, namespace)).collect();
    let parsed = SparqlQuery::parse(&format!("{}{}", prologue, text), None)
        .map_err(|err| syntax_error(&err.to_string(), DEFAULT_PREFIXES.len()))?;

    let mut pattern = match parsed {
        SparqlQuery::Select { dataset: None, pattern, .. } => pattern,
        SparqlQuery::Select { .. } => return Err(unsupported("FROM")),
        _ => return Err(CatalogError::QuerySyntax("only SELECT queries are supported".to_string())),
    };

    let mut limit = None;
    let mut distinct = false;
    let mut projection = Vec::new();
    loop {
        match pattern {
            GraphPattern::Slice { inner, start, length } => {
                if start != 0 {
                    return Err(unsupported("OFFSET"));
                }
                limit = length;
                pattern = *inner;
            }
            GraphPattern::Distinct { inner } => {
                distinct = true;
                pattern = *inner;
            }
            GraphPattern::Reduced { .. } => return Err(unsupported("REDUCED")),
            GraphPattern::Project { inner, variables } => {
                projection = variables.iter().map(|v| Variable::new(v.as_str())).collect();
                pattern = *inner;
            }
            other => {
                pattern = other;
                break;
            }
        }
    }

    let mut groups = Vec::new();
    lower(&pattern, &mut groups)?;

    if selects_all(text) {
        projection = variables_in(&groups);
        if projection.is_empty() {
            return Err(CatalogError::QuerySyntax("SELECT * over a query without variables".to_string()));
        }
    }
    Ok(Query::new(groups, projection)?.with_distinct(distinct).with_limit(limit))
}

/// Appends the groups of `pattern` in evaluation order. Contiguous triples form
/// one required group; each OPTIONAL block is its own group.
fn lower(pattern: &GraphPattern, groups: &mut Vec<PatternGroup>) -> Result<()> {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            if !patterns.is_empty() {
                groups.push(PatternGroup::required(lower_triples(patterns)?));
            }
        }
        GraphPattern::Join { left, right } => {
            lower(left, groups)?;
            lower(right, groups)?;
        }
        GraphPattern::LeftJoin { left, right, expression } => {
            if expression.is_some() {
                return Err(unsupported("FILTER"));
            }
            lower(left, groups)?;
            match right.as_ref() {
                GraphPattern::Bgp { patterns } => groups.push(PatternGroup::optional(lower_triples(patterns)?)),
                _ => return Err(unsupported("nested OPTIONAL")),
            }
        }
        GraphPattern::Filter { .. } => return Err(unsupported("FILTER")),
        GraphPattern::Union { .. } => return Err(unsupported("UNION")),
        GraphPattern::Graph { .. } => return Err(unsupported("GRAPH")),
        GraphPattern::Extend { .. } => return Err(unsupported("BIND")),
        GraphPattern::Minus { .. } => return Err(unsupported("MINUS")),
        GraphPattern::Values { .. } => return Err(unsupported("VALUES")),
        GraphPattern::Service { .. } => return Err(unsupported("SERVICE")),
        GraphPattern::Path { .. } => return Err(unsupported("a property path")),
        GraphPattern::OrderBy { .. } => return Err(unsupported("ORDER BY")),
        GraphPattern::Group { .. } => return Err(unsupported("GROUP BY")),
        _ => return Err(unsupported("a nested sub-query")),
    }
    Ok(())
}

fn lower_triples(patterns: &[SparqlTriplePattern]) -> Result<Vec<TriplePattern>> {
    patterns
        .iter()
        .map(|p| {
            let predicate = match &p.predicate {
                NamedNodePattern::NamedNode(node) => PatternTerm::from(Iri::new(node.as_str())),
                NamedNodePattern::Variable(v) => PatternTerm::Variable(Variable::new(v.as_str())),
            };
            Ok(TriplePattern::new(lower_term(&p.subject)?, predicate, lower_term(&p.object)?))
        })
        .collect()
}

fn lower_term(term: &TermPattern) -> Result<PatternTerm> {
    match term {
        TermPattern::NamedNode(node) => Ok(PatternTerm::from(Iri::new(node.as_str()))),
        TermPattern::Variable(v) => Ok(PatternTerm::Variable(Variable::new(v.as_str()))),
        TermPattern::Literal(literal) => {
            if literal.language().is_some() {
                return Err(CatalogError::QuerySyntax(format!(
                    "language-tagged literal {} is not supported",
                    literal
                )));
            }
            let literal = Literal::from_typed(literal.value(), Iri::new(literal.datatype().as_str()))?;
            Ok(PatternTerm::Constant(Term::Literal(literal)))
        }
        other => Err(CatalogError::QuerySyntax(format!("{} is not supported, use a variable", other))),
    }
}

fn unsupported(construct: &str) -> CatalogError {
    CatalogError::QuerySyntax(format!("{} is not supported", construct))
}

/// `SELECT *` projects variables in order of first appearance, which the algebra
/// does not preserve.
fn selects_all(text: &str) -> bool {
    static STAR: OnceLock<Regex> = OnceLock::new();
    STAR.get_or_init(|| Regex::new(r"(?i)\bSELECT\s+(DISTINCT\s+)?\*").expect("star pattern is valid"))
        .is_match(text)
}

/// Maps a parser message to a `Parse` error positioned in the caller's text.
fn syntax_error(message: &str, prologue_lines: usize) -> CatalogError {
    static POSITION: OnceLock<Regex> = OnceLock::new();
    let position = POSITION.get_or_init(|| Regex::new(r"error at (\d+):(\d+)").expect("position pattern is valid"));
    let (line, column) = position
        .captures(message)
        .and_then(|c| Some((c[1].parse::<usize>().ok()?, c[2].parse::<usize>().ok()?)))
        .map_or((1, 1), |(line, column)| (line.saturating_sub(prologue_lines).max(1), column));
    CatalogError::parse(line, column, message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocab::{self, ex};
    use crate::querying::query::var;

    #[test]
    fn test_builtin_style_query() {
        let query = parse_query(
            "PREFIX ex: <http://example.org/gadgetstore#>\n\
             SELECT ?product ?brand WHERE {\n\
               ?product a ex:Product .\n\
               ?product ex:hasBrand ?brand .\n\
             }",
        )
        .unwrap();
        assert_eq!(query.projection(), &[var("product"), var("brand")]);
        assert_eq!(query.groups().len(), 1);
        let first = &query.groups()[0].patterns[0];
        assert_eq!(first.predicate, PatternTerm::from(vocab::rdf_type()));
        assert_eq!(first.object, PatternTerm::from(ex("Product")));
    }

    #[test]
    fn test_optional_blocks_split_groups() {
        let query = parse_query(
            "SELECT ?order ?total ?date WHERE { ?order a ex:Order . \
             OPTIONAL { ?order ex:totalPrice ?total } \
             ?order ex:purchasedBy ?c . \
             OPTIONAL { ?order ex:hasDate ?date . } }",
        )
        .unwrap();
        let kinds: Vec<bool> = query.groups().iter().map(PatternGroup::is_optional).collect();
        assert_eq!(kinds, vec![false, true, false, true]);
    }

    #[test]
    fn test_semicolon_and_comma_lists() {
        let query =
            parse_query("SELECT * { ?o ex:orderContains ex:iPhone15, ex:MacBookAir ; ex:purchasedBy ?c }")
                .unwrap();
        assert_eq!(query.pattern_count(), 3);
        assert_eq!(query.projection(), &[var("o"), var("c")]);
    }

    #[test]
    fn test_distinct_limit_and_literals() {
        let query = parse_query(
            "SELECT DISTINCT ?p WHERE { ?p rdfs:label \"MacBook Air\" ; ex:hasPrice 1999.00 } LIMIT 5",
        )
        .unwrap();
        assert!(query.is_distinct());
        assert_eq!(query.limit(), Some(5));
        let patterns = &query.groups()[0].patterns;
        assert_eq!(patterns[0].object, PatternTerm::Constant(Term::Literal(Literal::string("MacBook Air"))));
        assert_eq!(
            patterns[1].object,
            PatternTerm::Constant(Term::Literal(Literal::decimal("1999.00").unwrap()))
        );
    }

    #[test]
    fn test_syntax_errors_carry_position() {
        let err = parse_query("SELECT ?p WHERE {\n  ?p ex:hasBrand\n}").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 3, .. }), "{err}");

        let err = parse_query("SELECT ?p WHERE { ?p ex:hasBrand ?b").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 1, .. }), "{err}");

        assert!(matches!(parse_query("SELECT ?p { ?p nope:x ?b }"), Err(CatalogError::Parse { .. })));
    }

    #[test]
    fn test_position_falls_back_to_start() {
        let err = syntax_error("no position here", 5);
        assert!(matches!(err, CatalogError::Parse { line: 1, column: 1, .. }));
        let err = syntax_error("error at 7:3: expected one of \"}\"", 5);
        assert!(matches!(err, CatalogError::Parse { line: 2, column: 3, .. }));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(parse_query("SELECT WHERE { ?s ?p ?o }"), Err(CatalogError::Parse { .. })));
        assert!(matches!(
            parse_query("SELECT ?s WHERE { ?s ?p ?o } LIMIT all"),
            Err(CatalogError::Parse { .. })
        ));
        assert!(matches!(
            parse_query("SELECT ?z WHERE { ?s ?p ?o }"),
            Err(CatalogError::UnboundProjectionVariable(name)) if name == "z"
        ));
        assert!(matches!(parse_query("SELECT ?x WHERE { }"), Err(CatalogError::UnboundProjectionVariable(_))));
        assert!(matches!(parse_query("SELECT * { ex:a ex:b ex:c }"), Err(CatalogError::QuerySyntax(_))));
    }

    #[test]
    fn test_unsupported_constructs() {
        for text in [
            "SELECT ?s { ?s ?p ?o FILTER(?o) }",
            "SELECT ?s { ?s ?p ?o OPTIONAL { ?s ?p ?x FILTER(?x) } }",
            "SELECT ?s { ?s ?p ?o OPTIONAL { ?s ?p ?o OPTIONAL { ?s ?p ?x } } }",
            "SELECT ?s { ?s ?p ?o } ORDER BY ?s",
            "SELECT ?s { ?s ?p ?o } LIMIT 5 OFFSET 10",
            "SELECT ?s { { ?s ?p ?o } UNION { ?o ?p ?s } }",
            "SELECT ?s { ?s ex:hasBrand/ex:name ?o }",
            "SELECT ?s { ?s ?p _:b }",
            "ASK { ?s ?p ?o }",
        ] {
            assert!(matches!(parse_query(text), Err(CatalogError::QuerySyntax(_))), "{}", text);
        }
    }

    #[test]
    fn test_comments_are_ignored() {
        let query = parse_query("# all statements\nSELECT ?s ?p ?o WHERE { ?s ?p ?o } # trailing\nLIMIT 50").unwrap();
        assert_eq!(query.limit(), Some(50));
    }
}
