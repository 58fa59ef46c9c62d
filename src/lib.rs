//! # Gadget Store
//!
//! A storefront catalog kept as subject-predicate-object triples. Products,
//! brands, categories, customers and orders are plain statements in an indexed
//! in-memory store, persisted as Turtle and queried through graph patterns with
//! required and optional groups.
//!
//! ## Features
//!
//! - Indexed triple store with subject, predicate and object lookups
//! - Round-trip Turtle persistence
//! - Pattern query engine with shared-variable joins and left-outer optional groups
//! - Bulk import of rows fetched from a relational source
//! - Named query catalog, CLI and HTTP surfaces
//!
//! ## Example
//!
//! ```rust
//! use gadgetstore::core::vocab::{self, ex};
//! use gadgetstore::querying::{PatternQueryEngine, QueryEngine};
//! use gadgetstore::storage::TripleStore;
//!
//! fn example() -> gadgetstore::Result<()> {
//!     let mut store = TripleStore::new();
//!     store.insert(ex("iPhone15"), vocab::rdf_type(), ex("Product"));
//!     store.insert(ex("iPhone15"), ex(vocab::HAS_BRAND), ex("Apple"));
//!
//!     let table = PatternQueryEngine::new().execute_query(
//!         "SELECT ?product ?brand WHERE { ?product a ex:Product ; ex:hasBrand ?brand }",
//!         &store,
//!     )?;
//!     assert_eq!(table.len(), 1);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::new_without_default)]
#![allow(clippy::return_self_not_must_use)]

/// Core data structures and vocabulary
pub mod core;

/// Triple store and its term dictionary
pub mod storage;

/// Turtle and query text parsing
pub mod parsing;

/// Query AST, evaluation and result tables
pub mod querying;

/// Relational row sources and the importer
pub mod sources;

/// Named query catalog
pub mod registry {
    pub mod query_registry;

    pub use query_registry::{NamedQuery, QueryRegistry};
}

/// Collaborator-facing catalog API
pub mod api;

/// HTTP surface
pub mod http;

pub mod error;

// Re-export commonly used types
pub use error::{CatalogError, Result};
