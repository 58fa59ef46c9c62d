use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::parsing::query_parser::parse_query;
use crate::querying::query::Query;

pub type QueryKey = String;

/// A stored query with its display metadata. The text is parsed once, at
/// registration.
#[derive(Debug, Clone, Serialize)]
pub struct NamedQuery {
    pub key: QueryKey,
    pub title: String,
    pub description: String,
    pub text: String,
    #[serde(skip)]
    pub query: Query,
    pub registered_at: u64,
}

const PRODUCTS_BY_BRAND: &str = "\
PREFIX ex: <http://example.org/gadgetstore#>
SELECT ?product ?brand WHERE {
  ?product a ex:Product .
  ?product ex:hasBrand ?brand .
}
";

const BUYERS_OF_IPHONE15: &str = "\
PREFIX ex: <http://example.org/gadgetstore#>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
SELECT ?customerName ?order WHERE {
  ?order a ex:Order .
  ?order ex:orderContains ex:iPhone15 .
  ?order ex:purchasedBy ?customer .
  ?customer foaf:name ?customerName .
}
";

const LAPTOPS: &str = "\
PREFIX ex: <http://example.org/gadgetstore#>
SELECT ?product WHERE {
  ?product a ex:Product .
  ?product ex:belongsToCategory ex:Laptop .
}
";

const ORDER_LIST: &str = "\
PREFIX ex: <http://example.org/gadgetstore#>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
SELECT ?order ?customerName ?total ?date WHERE {
  ?order a ex:Order .
  ?order ex:purchasedBy ?customer .
  ?customer foaf:name ?customerName .
  OPTIONAL { ?order ex:totalPrice ?total }
  OPTIONAL { ?order ex:hasDate ?date }
}
";

/// The storefront queries available out of the box: (key, title, description, text).
pub const BUILTIN_QUERIES: [(&str, &str, &str, &str); 4] = [
    (
        "products-by-brand",
        "Products and brands",
        "Every product together with its brand.",
        PRODUCTS_BY_BRAND,
    ),
    (
        "buyers-of-iphone15",
        "Who bought the iPhone 15",
        "Customers and the orders in which they bought ex:iPhone15.",
        BUYERS_OF_IPHONE15,
    ),
    ("laptops", "Laptops", "Every product in the Laptop category.", LAPTOPS),
    (
        "order-list",
        "Order list",
        "All orders with customer name, total price and purchase date.",
        ORDER_LIST,
    ),
];

/// Named queries in registration order. Keys are unique.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    queries: Vec<NamedQuery>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        QueryRegistry { queries: Vec::new() }
    }

    /// A registry holding the four storefront queries.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for (key, title, description, text) in BUILTIN_QUERIES {
            registry.register(key, title, description, text)?;
        }
        Ok(registry)
    }

    /// Parses `text` and stores it under `key`, replacing an existing entry with
    /// the same key in place. A query that fails to parse is not registered.
    pub fn register(&mut self, key: &str, title: &str, description: &str, text: &str) -> Result<&NamedQuery> {
        let key = key.trim();
        if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(CatalogError::QuerySyntax(format!(
                "query key '{}' must be non-empty without whitespace or '/'",
                key
            )));
        }
        let query = parse_query(text)?;
        let entry = NamedQuery {
            key: key.to_string(),
            title: if title.trim().is_empty() { key.to_string() } else { title.trim().to_string() },
            description: description.trim().to_string(),
            text: text.to_string(),
            query,
            registered_at: now_millis(),
        };

        let index = match self.queries.iter().position(|q| q.key == key) {
            Some(index) => {
                self.queries[index] = entry;
                index
            }
            None => {
                self.queries.push(entry);
                self.queries.len() - 1
            }
        };
        debug!(key, "Registered named query");
        Ok(&self.queries[index])
    }

    pub fn get(&self, key: &str) -> Result<&NamedQuery> {
        self.queries
            .iter()
            .find(|q| q.key == key)
            .ok_or_else(|| CatalogError::UnknownQuery(key.to_string()))
    }

    pub fn list(&self) -> &[NamedQuery] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_parse_in_order() {
        let registry = QueryRegistry::with_builtins().unwrap();
        let keys: Vec<&str> = registry.list().iter().map(|q| q.key.as_str()).collect();
        assert_eq!(keys, vec!["products-by-brand", "buyers-of-iphone15", "laptops", "order-list"]);
        let order_list = registry.get("order-list").unwrap();
        assert_eq!(order_list.query.projection().len(), 4);
        assert_eq!(order_list.query.groups().iter().filter(|g| g.is_optional()).count(), 2);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = QueryRegistry::with_builtins().unwrap();
        registry
            .register("laptops", "Laptops v2", "", "SELECT ?p WHERE { ?p ex:belongsToCategory ex:Laptop }")
            .unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.list()[2].title, "Laptops v2");
    }

    #[test]
    fn test_invalid_registration_changes_nothing() {
        let mut registry = QueryRegistry::new();
        assert!(matches!(
            registry.register("broken", "Broken", "", "SELECT ?p WHERE { ?p ex:hasBrand"),
            Err(CatalogError::Parse { .. })
        ));
        assert!(registry.register("has space", "", "", "SELECT ?s { ?s ?p ?o }").is_err());
        assert!(registry.is_empty());
        assert!(matches!(registry.get("broken"), Err(CatalogError::UnknownQuery(_))));
    }
}
