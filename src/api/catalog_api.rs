//! Catalog façade consumed by the CLI and the HTTP server.
//!
//! `CatalogApi` owns the single store instance, the named query registry and the
//! configuration. Mutating calls persist afterwards when autosave is on; a failed
//! save is returned as `StoreIo` while the in-memory mutation is kept.

use std::io;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::vocab::{self, entity, ex};
use crate::core::{EntityKind, Iri, Literal, Statement, Term};
use crate::error::{CatalogError, Result};
use crate::parsing::{query_parser::parse_query, turtle};
use crate::querying::engine::{PatternQueryEngine, QueryEngine};
use crate::querying::query::Query;
use crate::querying::results::ResultTable;
use crate::registry::query_registry::{NamedQuery, QueryRegistry};
use crate::sources::relational_importer::{ImportSummary, RelationalImporter};
use crate::sources::relational_source::{ImportBatch, RelationalSource, SourceValue};
use crate::storage::util::StoreConfig;
use crate::storage::TripleStore;

/// Attributes accepted by [`CatalogApi::insert_entity`]. Which ones are required
/// depends on the entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityAttributes {
    pub label: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub customer: Option<String>,
    pub total_price: Option<SourceValue>,
    pub order_date: Option<String>,
    pub products: Vec<String>,
}

/// Statement count and entity counts per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub statements: usize,
    pub products: usize,
    pub categories: usize,
    pub brands: usize,
    pub customers: usize,
    pub orders: usize,
    pub named_queries: usize,
}

pub struct CatalogApi {
    store: TripleStore,
    registry: QueryRegistry,
    engine: PatternQueryEngine,
    importer: RelationalImporter,
    config: StoreConfig,
}

impl CatalogApi {
    /// Hydrates the store from `config.data_file`. A missing file yields an empty
    /// store; a malformed one fails with `Parse`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let store = hydrate(&config)?;
        Self::with_store(store, config)
    }

    /// An empty, seeded catalog that never touches the filesystem on its own.
    pub fn in_memory() -> Result<Self> {
        let config = StoreConfig { autosave: false, ..StoreConfig::default() };
        Self::with_store(TripleStore::new(), config)
    }

    pub fn with_store(mut store: TripleStore, config: StoreConfig) -> Result<Self> {
        if config.seed_schema {
            store.extend(vocab::schema_statements());
        }
        Ok(Self {
            store,
            registry: QueryRegistry::with_builtins()?,
            engine: PatternQueryEngine::new(),
            importer: RelationalImporter::new(),
            config,
        })
    }

    pub fn store(&self) -> &TripleStore {
        &self.store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    /// Adds one statement. Returns `true` when it was new.
    pub fn insert_statement(&mut self, statement: Statement) -> Result<bool> {
        let added = self.store.insert_statement(statement);
        if added {
            self.after_mutation()?;
        }
        Ok(added)
    }

    /// Removes one statement. Returns `true` when it was present.
    pub fn remove_statement(&mut self, statement: &Statement) -> Result<bool> {
        let removed = self.store.remove_statement(statement);
        if removed {
            self.after_mutation()?;
        }
        Ok(removed)
    }

    /// Validates the attributes for `kind`, then inserts the entity's statements.
    /// Nothing is inserted when validation fails.
    pub fn insert_entity(&mut self, kind: EntityKind, id: &str, attrs: &EntityAttributes) -> Result<()> {
        let statements = entity_statements(kind, id, attrs)?;
        let count = statements.len();
        self.store.extend(statements);
        info!(%kind, id, statements = count, "Inserted entity");
        self.after_mutation()
    }

    /// Links two entities through one of the relationship predicates
    /// (`hasBrand`, `belongsToCategory`, `purchasedBy`, `orderContains`).
    pub fn insert_relationship(&mut self, subject_id: &str, predicate: &str, object_id: &str) -> Result<()> {
        let predicate = predicate.trim();
        if !vocab::RELATIONSHIPS.contains(&predicate) {
            return Err(CatalogError::InvalidEntity(format!(
                "unknown relationship '{}', expected one of {}",
                predicate,
                vocab::RELATIONSHIPS.join(", ")
            )));
        }
        let statement = Statement::new(entity(subject_id)?, ex(predicate), entity(object_id)?);
        self.store.insert_statement(statement);
        self.after_mutation()
    }

    pub fn run_query(&self, query: &Query) -> Result<ResultTable> {
        self.engine.evaluate(query, &self.store)
    }

    pub fn run_query_text(&self, text: &str) -> Result<ResultTable> {
        let query = parse_query(text)?;
        self.run_query(&query)
    }

    pub fn run_named_query(&self, key: &str) -> Result<ResultTable> {
        let named = self.registry.get(key)?;
        self.run_query(&named.query)
    }

    pub fn register_query(&mut self, key: &str, title: &str, description: &str, text: &str) -> Result<NamedQuery> {
        let named = self.registry.register(key, title, description, text)?;
        info!(key = %named.key, "Registered query");
        Ok(named.clone())
    }

    pub fn named_queries(&self) -> &[NamedQuery] {
        self.registry.list()
    }

    /// Imports a whole batch or nothing.
    pub fn bulk_import(&mut self, batch: &ImportBatch) -> Result<ImportSummary> {
        let summary = self.importer.import(batch, &mut self.store)?;
        self.after_mutation()?;
        Ok(summary)
    }

    pub fn import_from(&mut self, source: &dyn RelationalSource) -> Result<ImportSummary> {
        let batch = source.fetch()?;
        self.bulk_import(&batch)
    }

    /// Writes the store to the configured data file.
    pub fn persist(&self) -> Result<()> {
        turtle::save_to_path(&self.store, &self.config.data_file)
    }

    /// Replaces the in-memory store with the data file's content. On failure the
    /// current store is kept.
    ///
    /// Unlike [`CatalogApi::open`], a missing data file is a `StoreIo` error: a
    /// file deleted behind the catalog's back must not silently empty the store.
    pub fn reload(&mut self) -> Result<&TripleStore> {
        let path = &self.config.data_file;
        let loaded = if path.exists() {
            turtle::load_from_path(path)
        } else {
            Err(CatalogError::store_io(path, io::Error::new(io::ErrorKind::NotFound, "data file not found")))
        };
        let mut store = loaded.inspect_err(|err| warn!(error = %err, "Reload failed, keeping the current store"))?;
        if self.config.seed_schema {
            store.extend(vocab::schema_statements());
        }
        self.store = store;
        Ok(&self.store)
    }

    /// Local names of every subject typed as `kind`, sorted.
    pub fn list_entities(&self, kind: EntityKind) -> Vec<String> {
        let mut ids: Vec<String> =
            self.store.subjects_of_type(&kind.class_iri()).map(|iri| iri.local_name().to_string()).collect();
        ids.sort();
        ids
    }

    /// One row per product: id, label, brand and category.
    pub fn product_overview(&self) -> ResultTable {
        let columns = ["id", "label", "brand", "category"].map(String::from).to_vec();
        let mut table = ResultTable::new(columns);
        let predicates = [vocab::label(), ex(vocab::HAS_BRAND), ex(vocab::BELONGS_TO_CATEGORY)];
        for product in self.sorted_subjects(EntityKind::Product) {
            let mut row = vec![Some(product.local_name().to_string())];
            row.extend(predicates.iter().map(|p| self.store.value_of(&product, p).map(|t| display_value(&t))));
            table.push_row(row);
        }
        table
    }

    /// One row per customer: id and name.
    pub fn customer_overview(&self) -> ResultTable {
        let mut table = ResultTable::new(vec!["id".to_string(), "name".to_string()]);
        let name = vocab::name();
        for customer in self.sorted_subjects(EntityKind::Customer) {
            let value = self.store.value_of(&customer, &name).map(|t| display_value(&t));
            table.push_row(vec![Some(customer.local_name().to_string()), value]);
        }
        table
    }

    pub fn export_turtle(&self) -> Result<String> {
        turtle::to_turtle_string(&self.store)
    }

    pub fn stats(&self) -> CatalogStats {
        let count = |kind: EntityKind| self.store.subjects_of_type(&kind.class_iri()).count();
        CatalogStats {
            statements: self.store.len(),
            products: count(EntityKind::Product),
            categories: count(EntityKind::Category),
            brands: count(EntityKind::Brand),
            customers: count(EntityKind::Customer),
            orders: count(EntityKind::Order),
            named_queries: self.registry.len(),
        }
    }

    fn sorted_subjects(&self, kind: EntityKind) -> Vec<Iri> {
        let mut subjects: Vec<Iri> = self.store.subjects_of_type(&kind.class_iri()).collect();
        subjects.sort();
        subjects
    }

    fn after_mutation(&self) -> Result<()> {
        if !self.config.autosave {
            return Ok(());
        }
        self.persist().inspect_err(|err| warn!(error = %err, "Autosave failed, change kept in memory"))
    }
}

fn hydrate(config: &StoreConfig) -> Result<TripleStore> {
    if config.data_file.exists() {
        turtle::load_from_path(&config.data_file)
    } else {
        info!(path = %config.data_file.display(), "Data file not found, starting with an empty store");
        Ok(TripleStore::new())
    }
}

/// Entity ids show as local names; literals as their lexical form.
fn display_value(term: &Term) -> String {
    match term {
        Term::Iri(iri) if iri.as_str().starts_with(vocab::EX) => iri.local_name().to_string(),
        other => other.to_string(),
    }
}

fn required<'a>(value: &'a Option<String>, kind: EntityKind, attribute: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CatalogError::InvalidEntity(format!("{} requires '{}'", kind, attribute)))
}

/// The statements describing one entity, validated up front.
pub fn entity_statements(kind: EntityKind, id: &str, attrs: &EntityAttributes) -> Result<Vec<Statement>> {
    let subject = entity(id)?;
    let mut statements = vec![Statement::new(subject.clone(), vocab::rdf_type(), kind.class_iri())];
    match kind {
        EntityKind::Brand | EntityKind::Category => {}
        EntityKind::Product => {
            let brand = entity(required(&attrs.brand, kind, "brand")?)?;
            let category = entity(required(&attrs.category, kind, "category")?)?;
            if let Some(label) = attrs.label.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
                statements.push(Statement::new(subject.clone(), vocab::label(), Literal::string(label)));
            }
            statements.push(Statement::new(subject.clone(), ex(vocab::HAS_BRAND), brand));
            statements.push(Statement::new(subject, ex(vocab::BELONGS_TO_CATEGORY), category));
        }
        EntityKind::Customer => {
            let name = required(&attrs.name, kind, "name")?;
            statements.push(Statement::new(subject, vocab::name(), Literal::string(name)));
        }
        EntityKind::Order => {
            let customer = entity(required(&attrs.customer, kind, "customer")?)?;
            let total = attrs
                .total_price
                .as_ref()
                .and_then(SourceValue::lexical)
                .ok_or_else(|| CatalogError::InvalidEntity(format!("{} requires 'total_price'", kind)))?;
            let date = required(&attrs.order_date, kind, "order_date")?;
            if attrs.products.iter().all(|p| p.trim().is_empty()) {
                return Err(CatalogError::InvalidEntity(format!("{} requires at least one product", kind)));
            }
            statements.push(Statement::new(subject.clone(), ex(vocab::PURCHASED_BY), customer));
            statements.push(Statement::new(subject.clone(), ex(vocab::TOTAL_PRICE), Literal::decimal(total)?));
            statements.push(Statement::new(subject.clone(), ex(vocab::HAS_DATE), Literal::date(date)?));
            for product in attrs.products.iter().filter(|p| !p.trim().is_empty()) {
                statements.push(Statement::new(subject.clone(), ex(vocab::ORDER_CONTAINS), entity(product)?));
            }
        }
    }
    Ok(statements)
}
