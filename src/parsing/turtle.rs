//! Turtle persistence for the triple store.
//!
//! Reading and writing go through `oxrdfio`. Loading is all-or-nothing: the whole
//! document is converted into statements before a store is built, so a syntax
//! error never yields a partial store. Saving writes to a sibling temporary file
//! and renames it over the destination.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use oxrdf::{Literal as RdfLiteral, NamedNode, Quad, Subject, Term as RdfTerm, Triple};
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
use tracing::{debug, info};

use crate::core::vocab::{self, DEFAULT_PREFIXES};
use crate::core::{Iri, Literal, Statement, Term};
use crate::error::{CatalogError, Result};
use crate::storage::TripleStore;

/// Parses a Turtle document into a new store.
///
/// Syntax errors are `Parse` with the position reported by the parser. Blank
/// nodes and language-tagged literals are valid Turtle the catalog cannot hold,
/// so they fail with `Unsupported`.
pub fn load(text: &str) -> Result<TripleStore> {
    let mut statements = Vec::new();
    for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(text.as_bytes()) {
        statements.push(into_statement(quad?)?);
    }
    let store: TripleStore = statements.into_iter().collect();
    debug!(statements = store.len(), "Parsed Turtle document");
    Ok(store)
}

/// Reads and parses a Turtle file. Bytes that are not UTF-8 are a `Parse` error
/// at the first offending position.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<TripleStore> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| CatalogError::store_io(path, e))?;
    let store = load(decode_utf8(&bytes)?)?;
    info!(path = %path.display(), statements = store.len(), "Loaded store");
    Ok(store)
}

/// Writes every statement as Turtle into `writer` and hands the writer back.
///
/// Statements are grouped by subject with `rdf:type` first. An IRI that is not a
/// valid absolute IRI, or a failing writer, is a `Serialization` error.
pub fn save<W: Write>(store: &TripleStore, writer: W) -> Result<W> {
    let triples = rdf_triples(store)?;
    write_triples(serializer()?, &triples, writer).map_err(|e| CatalogError::Serialization(e.to_string()))
}

/// Persists the store at `path`, replacing any previous content.
///
/// The store is converted before the file is touched, so a store that cannot be
/// written leaves the previous file in place.
pub fn save_to_path(store: &TripleStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let triples = rdf_triples(store)?;
    let serializer = serializer()?;
    let tmp = temp_path(path);
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(&tmp)?;
        let mut writer = write_triples(serializer, &triples, BufWriter::new(file))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&tmp, path)
    };
    if let Err(err) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(CatalogError::store_io(path, err));
    }
    info!(path = %path.display(), statements = store.len(), "Saved store");
    Ok(())
}

pub fn to_turtle_string(store: &TripleStore) -> Result<String> {
    let buffer = save(store, Vec::new())?;
    String::from_utf8(buffer).map_err(|e| CatalogError::Serialization(e.to_string()))
}

fn serializer() -> Result<RdfSerializer> {
    DEFAULT_PREFIXES.iter().try_fold(
        RdfSerializer::from_format(RdfFormat::Turtle),
        |serializer, (prefix, namespace)| {
            serializer
                .with_prefix(*prefix, *namespace)
                .map_err(|e| CatalogError::Serialization(format!("prefix {}: {}", prefix, e)))
        },
    )
}

fn write_triples<W: Write>(serializer: RdfSerializer, triples: &[Triple], writer: W) -> io::Result<W> {
    let mut serializer = serializer.for_writer(writer);
    for triple in triples {
        serializer.serialize_triple(triple.as_ref())?;
    }
    serializer.finish()
}

/// Statements sorted by subject, `rdf:type` first, so consecutive triples share
/// a subject block.
fn rdf_triples(store: &TripleStore) -> Result<Vec<Triple>> {
    let rdf_type = vocab::rdf_type();
    let mut statements: Vec<Statement> = store.iter().collect();
    statements.sort_by(|a, b| {
        (a.subject(), a.predicate() != &rdf_type, a.predicate(), a.object())
            .cmp(&(b.subject(), b.predicate() != &rdf_type, b.predicate(), b.object()))
    });
    statements.iter().map(to_rdf_triple).collect()
}

fn to_rdf_triple(statement: &Statement) -> Result<Triple> {
    let object: RdfTerm = match statement.object() {
        Term::Iri(iri) => named_node(iri)?.into(),
        Term::Literal(literal) => to_rdf_literal(literal)?.into(),
    };
    Ok(Triple::new(named_node(statement.subject())?, named_node(statement.predicate())?, object))
}

fn named_node(iri: &Iri) -> Result<NamedNode> {
    NamedNode::new(iri.as_str())
        .map_err(|e| CatalogError::Serialization(format!("invalid IRI <{}>: {}", iri, e)))
}

fn to_rdf_literal(literal: &Literal) -> Result<RdfLiteral> {
    if literal.datatype() == vocab::XSD_STRING {
        return Ok(RdfLiteral::new_simple_literal(literal.lexical_form()));
    }
    let datatype = named_node(&Iri::new(literal.datatype()))?;
    Ok(RdfLiteral::new_typed_literal(literal.lexical_form(), datatype))
}

fn into_statement(quad: Quad) -> Result<Statement> {
    let subject = match quad.subject {
        Subject::NamedNode(node) => Iri::new(node.as_str()),
        other => return Err(CatalogError::Unsupported(format!("subject {} is not an IRI", other))),
    };
    let object = match quad.object {
        RdfTerm::NamedNode(node) => Term::Iri(Iri::new(node.as_str())),
        RdfTerm::Literal(literal) => Term::Literal(from_rdf_literal(&literal)?),
        other => {
            return Err(CatalogError::Unsupported(format!("object {} is not an IRI or a literal", other)))
        }
    };
    Ok(Statement::new(subject, Iri::new(quad.predicate.as_str()), object))
}

fn from_rdf_literal(literal: &RdfLiteral) -> Result<Literal> {
    if literal.language().is_some() {
        return Err(CatalogError::Unsupported(format!("language-tagged literal {}", literal)));
    }
    Literal::from_typed(literal.value(), Iri::new(literal.datatype().as_str()))
}

fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| {
        let valid = String::from_utf8_lossy(&bytes[..err.valid_up_to()]);
        let line = valid.matches('\n').count() + 1;
        let column = valid.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        CatalogError::parse(line, column, format!("invalid UTF-8 at byte {}", err.valid_up_to()))
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocab::ex;

    #[test]
    fn test_output_uses_default_prefixes() {
        let mut store = TripleStore::new();
        store.insert(ex("Apple"), vocab::rdf_type(), ex("Brand"));
        store.insert(ex("iPhone15"), ex(vocab::HAS_BRAND), ex("Apple"));
        store.insert(ex("iPhone15"), vocab::rdf_type(), ex("Product"));

        let text = to_turtle_string(&store).unwrap();
        assert!(text.contains("@prefix ex: <http://example.org/gadgetstore#>"));
        assert!(text.contains("ex:Apple a ex:Brand"));
        let typed = text.find("ex:iPhone15 a ex:Product").unwrap();
        assert!(typed < text.find("ex:hasBrand ex:Apple").unwrap());
    }

    #[test]
    fn test_statement_order_puts_type_first() {
        let mut store = TripleStore::new();
        store.insert(ex("b"), ex(vocab::HAS_BRAND), ex("x"));
        store.insert(ex("a"), ex(vocab::HAS_BRAND), ex("x"));
        store.insert(ex("a"), vocab::rdf_type(), ex("Product"));

        let triples = rdf_triples(&store).unwrap();
        let order: Vec<(String, &str)> =
            triples.iter().map(|t| (t.subject.to_string(), t.predicate.as_str())).collect();
        assert_eq!(order[0], (format!("<{}a>", vocab::EX), vocab::RDF_TYPE));
        assert_eq!(order[2].0, format!("<{}b>", vocab::EX));
    }

    #[test]
    fn test_string_literals_are_plain() {
        let literal = to_rdf_literal(&Literal::string("say \"hi\"")).unwrap();
        assert_eq!(literal.value(), "say \"hi\"");
        assert_eq!(literal.datatype().as_str(), vocab::XSD_STRING);
        let date = to_rdf_literal(&Literal::date("2024-01-31").unwrap()).unwrap();
        assert_eq!(date.datatype().as_str(), vocab::XSD_DATE);
    }

    #[test]
    fn test_invalid_iri_cannot_be_written() {
        let mut store = TripleStore::new();
        store.insert(ex("has space"), vocab::rdf_type(), ex("Product"));
        assert!(matches!(to_turtle_string(&store), Err(CatalogError::Serialization(_))));
    }

    #[test]
    fn test_load_reports_syntax_position() {
        let text = "@prefix ex: <http://example.org/gadgetstore#> .\nex:a ex:b ex:c .\nex:d ex:e .\n";
        match load(text) {
            Err(CatalogError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_unrepresentable_terms() {
        assert!(matches!(load("_:b <http://a> <http://b> ."), Err(CatalogError::Unsupported(_))));
        assert!(matches!(load("<http://a> <http://b> \"chat\"@fr ."), Err(CatalogError::Unsupported(_))));
        assert!(matches!(
            load("<http://a> <http://b> \"soon\"^^<http://www.w3.org/2001/XMLSchema#date> ."),
            Err(CatalogError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_position() {
        let err = decode_utf8(b"@prefix\n ab\xff").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 2, column: 4, .. }), "{err}");
    }

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(temp_path(Path::new("/data/store.ttl")), PathBuf::from("/data/store.ttl.tmp"));
    }
}
