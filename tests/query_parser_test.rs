//! Integration tests for the query text parser

use gadgetstore::core::vocab::{self, ex};
use gadgetstore::core::{Literal, Term};
use gadgetstore::parsing::parse_query;
use gadgetstore::querying::query::{var, GroupKind, PatternTerm};
use gadgetstore::registry::query_registry::BUILTIN_QUERIES;
use gadgetstore::CatalogError;

#[test]
fn test_builtin_query_texts_parse() {
    for (key, _, _, text) in BUILTIN_QUERIES {
        let query = parse_query(text).unwrap_or_else(|e| panic!("{} failed to parse: {}", key, e));
        assert!(query.pattern_count() > 0, "{}", key);
    }
}

#[test]
fn test_groups_follow_the_text() {
    let query = parse_query(
        "PREFIX shop: <http://example.org/gadgetstore#>
         SELECT ?order ?total ?date WHERE {
           ?order a shop:Order .
           OPTIONAL { ?order shop:totalPrice ?total . }
           ?order shop:purchasedBy ?customer .
           OPTIONAL { ?order shop:hasDate ?date }
         }",
    )
    .unwrap();

    let kinds: Vec<GroupKind> = query.groups().iter().map(|g| g.kind).collect();
    assert_eq!(
        kinds,
        vec![GroupKind::Required, GroupKind::Optional, GroupKind::Required, GroupKind::Optional]
    );
    assert_eq!(query.groups()[0].patterns[0].object, PatternTerm::Constant(Term::Iri(ex("Order"))));
    assert_eq!(query.projection(), &[var("order"), var("total"), var("date")]);
}

#[test]
fn test_predicate_object_lists_expand() {
    let query = parse_query(
        "SELECT ?p WHERE { ?p a ex:Product ; ex:hasBrand ex:Apple , ex:Beats ; rdfs:label ?l }",
    )
    .unwrap();
    assert_eq!(query.pattern_count(), 4);
    let predicates: Vec<&PatternTerm> = query.groups()[0].patterns.iter().map(|p| &p.predicate).collect();
    assert_eq!(predicates[0], &PatternTerm::Constant(Term::Iri(vocab::rdf_type())));
    assert_eq!(predicates[3], &PatternTerm::Constant(Term::Iri(vocab::label())));
}

#[test]
fn test_literal_objects() {
    let query = parse_query(
        "SELECT ?o WHERE { ?o ex:totalPrice \"999.00\"^^xsd:decimal . ?o ex:note \"gift\" }",
    )
    .unwrap();
    let patterns = &query.groups()[0].patterns;
    assert_eq!(patterns[0].object, PatternTerm::Constant(Term::Literal(Literal::decimal("999.00").unwrap())));
    assert_eq!(patterns[1].object, PatternTerm::Constant(Term::Literal(Literal::string("gift"))));
}

#[test]
fn test_keywords_are_case_insensitive() {
    let query = parse_query("select distinct ?b where { ?p ex:hasBrand ?b } limit 5").unwrap();
    assert!(query.is_distinct());
    assert_eq!(query.limit(), Some(5));
}

#[test]
fn test_where_keyword_is_optional() {
    assert!(parse_query("SELECT ?p { ?p a ex:Product }").is_ok());
}

#[test]
fn test_variable_sigils_are_interchangeable() {
    let query = parse_query("SELECT $p WHERE { ?p a ex:Product }").unwrap();
    assert_eq!(query.projection(), &[var("p")]);
}

#[test]
fn test_structural_errors_are_query_syntax() {
    for text in [
        "SELECT * WHERE { ex:a ex:b ex:c }",
        "SELECT ?s WHERE { ?s ?p ?o . OPTIONAL { } }",
        "SELECT ?p WHERE { \"label\" ex:hasBrand ?p }",
    ] {
        assert!(matches!(parse_query(text), Err(CatalogError::QuerySyntax(_))), "{}", text);
    }
}

#[test]
fn test_grammar_errors_are_parse_errors() {
    for text in [
        "SELECT WHERE { ?s ?p ?o }",
        "SELECT ?s WHERE { ?s ?p ?o } LIMIT ten",
        "SELECT ?s WHERE { ?s ?p ?o",
        "SELECT ?s WHERE { ?s ?p }",
        "SELECT ?s WHERE { ?s unknown:p ?o }",
        "SELECT ?s WHERE { ?s ?p ?o } trailing",
        "SELECT ?s WHERE { ?s ?p \"unterminated }",
        "SELECT ?s WHERE { ?s ?p ?o . UNION { ?s ?p ?o } }",
    ] {
        assert!(matches!(parse_query(text), Err(CatalogError::Parse { .. })), "{}", text);
    }
}

#[test]
fn test_unsupported_constructs_are_named() {
    for (text, construct) in [
        ("SELECT ?s WHERE { ?s ?p ?o . FILTER(?o) }", "FILTER"),
        ("SELECT ?s WHERE { ?s ?p ?o } ORDER BY ?s", "ORDER BY"),
        ("SELECT ?s WHERE { { ?s ?p ?o } UNION { ?o ?p ?s } }", "UNION"),
        ("SELECT ?s WHERE { ?s ?p ?o . OPTIONAL { ?s ?p ?x . OPTIONAL { ?s ?p ?y } } }", "OPTIONAL"),
        ("SELECT ?s WHERE { ?s ?p ?o } OFFSET 5", "OFFSET"),
        ("SELECT ?s FROM <http://example.org/g> WHERE { ?s ?p ?o }", "FROM"),
    ] {
        match parse_query(text) {
            Err(CatalogError::QuerySyntax(message)) => assert!(message.contains(construct), "{}", message),
            other => panic!("{}: expected query syntax error, got {:?}", text, other),
        }
    }
}

#[test]
fn test_base_and_missing_dot_before_optional_are_accepted() {
    assert!(parse_query("BASE <http://example.org/> SELECT ?s WHERE { ?s ?p ?o }").is_ok());
    let query =
        parse_query("SELECT ?o ?total WHERE { ?o ex:purchasedBy ex:alice OPTIONAL { ?o ex:totalPrice ?total } }")
            .unwrap();
    assert_eq!(query.groups().len(), 2);
    assert_eq!(query.groups()[1].kind, GroupKind::Optional);
}

#[test]
fn test_error_position_points_at_offending_line() {
    let text = "SELECT ?s WHERE {\n  ?s ex:hasBrand ?b .\n  ?s ex:hasBrand\n}";
    match parse_query(text) {
        Err(CatalogError::Parse { line, .. }) => assert_eq!(line, 4),
        other => panic!("expected parse error, got {:?}", other),
    }
}
