//! Maps relational rows to catalog statements.

use serde::Serialize;
use tracing::info;

use crate::core::vocab::{self, entity, ex};
use crate::core::{EntityKind, Literal, Statement};
use crate::error::Result;
use crate::sources::relational_source::{ImportBatch, RelationalSource};
use crate::storage::TripleStore;

/// Rows consumed per table and statements that were new to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub brands: usize,
    pub categories: usize,
    pub products: usize,
    pub customers: usize,
    pub orders: usize,
    pub order_links: usize,
    pub statements_added: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RelationalImporter;

impl RelationalImporter {
    pub fn new() -> Self {
        RelationalImporter
    }

    /// The statements for a batch in insertion order: brands, categories,
    /// products, customers, orders, then order links.
    ///
    /// The whole batch is validated here, so a bad row fails the import before
    /// anything reaches the store.
    pub fn statements(&self, batch: &ImportBatch) -> Result<Vec<Statement>> {
        let rdf_type = vocab::rdf_type();
        let mut out = Vec::with_capacity(batch.row_count() * 3);

        for row in &batch.brands {
            out.push(Statement::new(entity(&row.id)?, rdf_type.clone(), EntityKind::Brand.class_iri()));
        }
        for row in &batch.categories {
            out.push(Statement::new(entity(&row.id)?, rdf_type.clone(), EntityKind::Category.class_iri()));
        }
        for row in &batch.products {
            let product = entity(&row.id)?;
            out.push(Statement::new(product.clone(), rdf_type.clone(), EntityKind::Product.class_iri()));
            if let Some(label) = row.label.as_deref().filter(|l| !l.is_empty()) {
                out.push(Statement::new(product.clone(), vocab::label(), Literal::string(label)));
            }
            out.push(Statement::new(product.clone(), ex(vocab::HAS_BRAND), entity(&row.brand_id)?));
            out.push(Statement::new(product, ex(vocab::BELONGS_TO_CATEGORY), entity(&row.category_id)?));
        }
        for row in &batch.customers {
            let customer = entity(&row.id)?;
            out.push(Statement::new(customer.clone(), rdf_type.clone(), EntityKind::Customer.class_iri()));
            out.push(Statement::new(customer, vocab::name(), Literal::string(row.name.as_str())));
        }
        for row in &batch.orders {
            let order = entity(&row.id)?;
            out.push(Statement::new(order.clone(), rdf_type.clone(), EntityKind::Order.class_iri()));
            out.push(Statement::new(order.clone(), ex(vocab::PURCHASED_BY), entity(&row.customer_id)?));
            if let Some(total) = row.total_price.as_ref().and_then(|v| v.lexical()) {
                out.push(Statement::new(order.clone(), ex(vocab::TOTAL_PRICE), Literal::decimal(total)?));
            }
            if let Some(date) = row.order_date.as_deref().filter(|d| !d.trim().is_empty()) {
                out.push(Statement::new(order, ex(vocab::HAS_DATE), Literal::date(date)?));
            }
        }
        for row in &batch.order_contains {
            out.push(Statement::new(
                entity(&row.order_id)?,
                ex(vocab::ORDER_CONTAINS),
                entity(&row.product_id)?,
            ));
        }
        Ok(out)
    }

    pub fn import(&self, batch: &ImportBatch, store: &mut TripleStore) -> Result<ImportSummary> {
        let statements = self.statements(batch)?;
        let statements_added = statements.into_iter().filter(|s| store.insert_statement(s.clone())).count();
        let summary = ImportSummary {
            brands: batch.brands.len(),
            categories: batch.categories.len(),
            products: batch.products.len(),
            customers: batch.customers.len(),
            orders: batch.orders.len(),
            order_links: batch.order_contains.len(),
            statements_added,
        };
        info!(
            brands = summary.brands,
            categories = summary.categories,
            products = summary.products,
            customers = summary.customers,
            orders = summary.orders,
            order_links = summary.order_links,
            statements_added,
            "Imported relational batch"
        );
        Ok(summary)
    }

    pub fn import_from(&self, source: &dyn RelationalSource, store: &mut TripleStore) -> Result<ImportSummary> {
        let batch = source.fetch()?;
        self.import(&batch, store)
    }
}
