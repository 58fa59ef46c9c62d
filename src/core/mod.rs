//! Core data structures for the gadget store triple model.
//!
//! Terms are a tagged union rather than raw strings so that a decimal `"5"` and a
//! string `"5"` never compare equal.

use crate::error::{CatalogError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub mod vocab;
pub use vocab::EntityKind;

/// An opaque, namespace-qualified identifier. Compared by exact string equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(Arc<str>);

impl Iri {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the last `#` or `/`, used for display and entity ids.
    pub fn local_name(&self) -> &str {
        let value = self.as_str();
        match value.rfind(|c| c == '#' || c == '/') {
            Some(idx) => &value[idx + 1..],
            None => value,
        }
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Iri::new(value)
    }
}

fn decimal_regex() -> &'static Regex {
    static DECIMAL: OnceLock<Regex> = OnceLock::new();
    DECIMAL.get_or_init(|| {
        Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)$").expect("decimal pattern is valid")
    })
}

/// A typed scalar value. Equality uses lexical form plus datatype.
///
/// The representation is private: every literal is built through [`Literal::string`],
/// [`Literal::decimal`], [`Literal::date`] or [`Literal::from_typed`], so a decimal
/// always carries a valid lexical form and a known datatype always gets its
/// dedicated variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(LiteralValue);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum LiteralValue {
    String(String),
    Decimal(String),
    Date(NaiveDate),
    /// Any other datatype, carried through untouched
    Typed { lexical: String, datatype: Iri },
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Literal(LiteralValue::String(value.into()))
    }

    pub fn decimal(lexical: impl AsRef<str>) -> Result<Self> {
        let lexical = lexical.as_ref().trim();
        if decimal_regex().is_match(lexical) {
            Ok(Literal(LiteralValue::Decimal(lexical.to_string())))
        } else {
            Err(CatalogError::InvalidLiteral {
                datatype: vocab::XSD_DECIMAL.to_string(),
                lexical: lexical.to_string(),
            })
        }
    }

    /// Parses an ISO-8601 calendar date (`YYYY-MM-DD`).
    pub fn date(lexical: impl AsRef<str>) -> Result<Self> {
        let lexical = lexical.as_ref().trim();
        NaiveDate::parse_from_str(lexical, "%Y-%m-%d")
            .map(|date| Literal(LiteralValue::Date(date)))
            .map_err(|_| CatalogError::InvalidLiteral {
                datatype: vocab::XSD_DATE.to_string(),
                lexical: lexical.to_string(),
            })
    }

    /// Builds a literal from a lexical form and a datatype IRI, routing the three
    /// known datatypes to their dedicated variants.
    pub fn from_typed(lexical: impl Into<String>, datatype: Iri) -> Result<Self> {
        let lexical = lexical.into();
        match datatype.as_str() {
            vocab::XSD_STRING => Ok(Literal::string(lexical)),
            vocab::XSD_DECIMAL => Literal::decimal(&lexical),
            vocab::XSD_DATE => Literal::date(&lexical),
            _ => Ok(Literal(LiteralValue::Typed { lexical, datatype })),
        }
    }

    pub fn lexical_form(&self) -> String {
        match &self.0 {
            LiteralValue::String(value) | LiteralValue::Decimal(value) => value.clone(),
            LiteralValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            LiteralValue::Typed { lexical, .. } => lexical.clone(),
        }
    }

    pub fn datatype(&self) -> &str {
        match &self.0 {
            LiteralValue::String(_) => vocab::XSD_STRING,
            LiteralValue::Decimal(_) => vocab::XSD_DECIMAL,
            LiteralValue::Date(_) => vocab::XSD_DATE,
            LiteralValue::Typed { datatype, .. } => datatype.as_str(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical_form())
    }
}

/// Anything that can sit in the object position of a statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
}

impl Term {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(literal) => Some(literal),
            Term::Iri(_) => None,
        }
    }
}

/// Renders the full IRI or the literal's lexical form, which is what result
/// tables show in their cells.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => iri.fmt(f),
            Term::Literal(literal) => literal.fmt(f),
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

/// An immutable (subject, predicate, object) fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Statement {
    subject: Iri,
    predicate: Iri,
    object: Term,
}

impl Statement {
    pub fn new(subject: Iri, predicate: Iri, object: impl Into<Term>) -> Self {
        Self { subject, predicate, object: object.into() }
    }

    pub fn subject(&self) -> &Iri {
        &self.subject
    }

    pub fn predicate(&self) -> &Iri {
        &self.predicate
    }

    pub fn object(&self) -> &Term {
        &self.object
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> <{}> ", self.subject, self.predicate)?;
        match &self.object {
            Term::Iri(iri) => write!(f, "<{}> .", iri),
            Term::Literal(literal) => {
                write!(f, "{:?}^^<{}> .", literal.lexical_form(), literal.datatype())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(Iri::new("http://example.org/gadgetstore#iPhone15").local_name(), "iPhone15");
        assert_eq!(Iri::new("http://xmlns.com/foaf/0.1/name").local_name(), "name");
        assert_eq!(Iri::new("urn-without-separator").local_name(), "urn-without-separator");
    }

    #[test]
    fn test_literal_equality_includes_datatype() {
        let as_string = Literal::string("5");
        let as_decimal = Literal::decimal("5").unwrap();
        assert_ne!(as_string, as_decimal);
        assert_eq!(as_string.lexical_form(), as_decimal.lexical_form());
    }

    #[test]
    fn test_decimal_validation() {
        assert!(Literal::decimal("1500000.0").is_ok());
        assert!(Literal::decimal("-.5").is_ok());
        assert!(Literal::decimal("12,50").is_err());
        assert!(Literal::decimal("").is_err());
    }

    #[test]
    fn test_date_round_trips_iso_form() {
        let date = Literal::date("2024-03-09").unwrap();
        assert_eq!(date.lexical_form(), "2024-03-09");
        assert_eq!(date.datatype(), vocab::XSD_DATE);
        assert!(Literal::date("09/03/2024").is_err());
    }

    #[test]
    fn test_from_typed_routes_known_datatypes() {
        let lit = Literal::from_typed("42", Iri::new(vocab::XSD_DECIMAL)).unwrap();
        assert_eq!(lit, Literal::decimal("42").unwrap());
        let lit = Literal::from_typed("2024-02-29", Iri::new(vocab::XSD_DATE)).unwrap();
        assert_eq!(lit, Literal::date("2024-02-29").unwrap());
        assert!(Literal::from_typed("12,50", Iri::new(vocab::XSD_DECIMAL)).is_err());
        let lit = Literal::from_typed("true", Iri::new(vocab::XSD_BOOLEAN)).unwrap();
        assert_eq!(lit.datatype(), vocab::XSD_BOOLEAN);
        assert_eq!(lit.lexical_form(), "true");
    }
}
