//! Namespaces, predicates and entity classes of the storefront vocabulary.

use super::{Iri, Statement};
use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base namespace of every catalog entity and relationship.
pub const EX: &str = "http://example.org/gadgetstore#";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_PROPERTY: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property";
pub const RDFS_CLASS: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const FOAF_NAME: &str = "http://xmlns.com/foaf/0.1/name";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Prefix bindings written at the top of every persisted file and known to the
/// query parser without an explicit declaration.
pub const DEFAULT_PREFIXES: [(&str, &str); 5] =
    [("ex", EX), ("foaf", FOAF), ("rdf", RDF), ("rdfs", RDFS), ("xsd", XSD)];

/// Relationship predicates, all in the `ex:` namespace.
pub const HAS_BRAND: &str = "hasBrand";
pub const BELONGS_TO_CATEGORY: &str = "belongsToCategory";
pub const PURCHASED_BY: &str = "purchasedBy";
pub const ORDER_CONTAINS: &str = "orderContains";
pub const HAS_PRICE: &str = "hasPrice";
pub const HAS_DATE: &str = "hasDate";
pub const TOTAL_PRICE: &str = "totalPrice";

/// Predicates whose object is another entity rather than a literal.
pub const RELATIONSHIPS: [&str; 4] = [HAS_BRAND, BELONGS_TO_CATEGORY, PURCHASED_BY, ORDER_CONTAINS];

pub const PROPERTIES: [&str; 7] =
    [HAS_BRAND, BELONGS_TO_CATEGORY, PURCHASED_BY, ORDER_CONTAINS, HAS_PRICE, HAS_DATE, TOTAL_PRICE];

/// Resolves a local name against the base namespace.
pub fn ex(local: &str) -> Iri {
    Iri::new(format!("{EX}{local}"))
}

pub fn rdf_type() -> Iri {
    Iri::new(RDF_TYPE)
}

pub fn label() -> Iri {
    Iri::new(RDFS_LABEL)
}

pub fn name() -> Iri {
    Iri::new(FOAF_NAME)
}

/// Resolves a catalog id such as `iPhone15` to its entity IRI.
pub fn entity(id: &str) -> Result<Iri> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CatalogError::InvalidEntity("id must not be empty".to_string()));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(CatalogError::InvalidEntity(format!("id '{}' must not contain whitespace", id)));
    }
    Ok(ex(id))
}

/// Class declarations for every entity kind and property declarations for every
/// relationship predicate.
pub fn schema_statements() -> Vec<Statement> {
    let class = Iri::new(RDFS_CLASS);
    let property = Iri::new(RDF_PROPERTY);
    EntityKind::ALL
        .iter()
        .map(|kind| Statement::new(kind.class_iri(), rdf_type(), class.clone()))
        .chain(PROPERTIES.iter().map(|p| Statement::new(ex(p), rdf_type(), property.clone())))
        .collect()
}

/// The entity classes layered on top of plain triples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Product,
    Category,
    Brand,
    Customer,
    Order,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Product,
        EntityKind::Category,
        EntityKind::Brand,
        EntityKind::Customer,
        EntityKind::Order,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            EntityKind::Product => "Product",
            EntityKind::Category => "Category",
            EntityKind::Brand => "Brand",
            EntityKind::Customer => "Customer",
            EntityKind::Order => "Order",
        }
    }

    pub fn class_iri(self) -> Iri {
        ex(self.class_name())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.class_name().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown entity kind '{}'", value))
    }
}
