//! Row batches fetched from an external relational store.
//!
//! The catalog never opens that connection itself; a [`RelationalSource`] hands
//! over already-fetched rows, one table per entity kind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandRow {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub brand_id: String,
    pub category_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
}

/// A column value that may arrive as a JSON number or as text
/// (`DECIMAL` columns are commonly exported as strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceValue {
    Number(serde_json::Number),
    Text(String),
}

impl SourceValue {
    /// The lexical form, or `None` for blank text.
    pub fn lexical(&self) -> Option<String> {
        match self {
            SourceValue::Number(n) => Some(fixed_point(&n.to_string())),
            SourceValue::Text(text) if text.trim().is_empty() => None,
            SourceValue::Text(text) => Some(text.trim().to_string()),
        }
    }
}

/// Rewrites exponent notation (`1e-7`, `-2.5E+3`) as plain decimal digits by
/// shifting the point, so the result is a valid `xsd:decimal` lexical form.
fn fixed_point(number: &str) -> String {
    let Some((mantissa, exponent)) = number.split_once(['e', 'E']) else {
        return number.to_string();
    };
    let Ok(exponent) = exponent.parse::<i64>() else {
        return number.to_string();
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa.trim_start_matches('+')),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{}{}", int_part, frac_part);
    let point = int_part.len() as i64 + exponent;

    let (int_digits, frac_digits) = if point <= 0 {
        (String::new(), format!("{}{}", "0".repeat(point.unsigned_abs() as usize), digits))
    } else if point as usize >= digits.len() {
        (format!("{}{}", digits, "0".repeat(point as usize - digits.len())), String::new())
    } else {
        let (head, tail) = digits.split_at(point as usize);
        (head.to_string(), tail.to_string())
    };
    let int_digits = match int_digits.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let frac_digits = frac_digits.trim_end_matches('0');
    if frac_digits.is_empty() {
        format!("{}{}", sign, int_digits)
    } else {
        format!("{}{}.{}", sign, int_digits, frac_digits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: String,
    pub customer_id: String,
    #[serde(default)]
    pub total_price: Option<SourceValue>,
    #[serde(default)]
    pub order_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContainsRow {
    pub order_id: String,
    pub product_id: String,
}

/// Rows for every entity kind. Missing tables deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportBatch {
    pub brands: Vec<BrandRow>,
    pub categories: Vec<CategoryRow>,
    pub products: Vec<ProductRow>,
    pub customers: Vec<CustomerRow>,
    pub orders: Vec<OrderRow>,
    pub order_contains: Vec<OrderContainsRow>,
}

impl ImportBatch {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn row_count(&self) -> usize {
        self.brands.len()
            + self.categories.len()
            + self.products.len()
            + self.customers.len()
            + self.orders.len()
            + self.order_contains.len()
    }
}

pub trait RelationalSource {
    /// Fetches the current rows of every table.
    fn fetch(&self) -> Result<ImportBatch>;
}

impl RelationalSource for ImportBatch {
    fn fetch(&self) -> Result<ImportBatch> {
        Ok(self.clone())
    }
}

/// Reads an [`ImportBatch`] exported as a JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RelationalSource for JsonFileSource {
    fn fetch(&self) -> Result<ImportBatch> {
        let text = fs::read_to_string(&self.path).map_err(|e| CatalogError::store_io(&self.path, e))?;
        ImportBatch::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_accepts_missing_tables_and_mixed_values() {
        let batch = ImportBatch::from_json(
            r#"{
                "brands": [{"id": "Apple"}],
                "orders": [
                    {"id": "o1", "customer_id": "c1", "total_price": 1999.5, "order_date": "2024-05-01"},
                    {"id": "o2", "customer_id": "c1", "total_price": "250.00"},
                    {"id": "o3", "customer_id": "c2", "total_price": null}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(batch.row_count(), 4);
        assert!(batch.products.is_empty());
        assert_eq!(batch.orders[0].total_price.as_ref().and_then(SourceValue::lexical), Some("1999.5".into()));
        assert_eq!(batch.orders[1].total_price.as_ref().and_then(SourceValue::lexical), Some("250.00".into()));
        assert_eq!(batch.orders[2].total_price, None);
    }

    #[test]
    fn test_exponent_numbers_become_plain_decimals() {
        assert_eq!(fixed_point("1e-7"), "0.0000001");
        assert_eq!(fixed_point("-2.5E+3"), "-2500");
        assert_eq!(fixed_point("1.25e1"), "12.5");
        assert_eq!(fixed_point("1e20"), "100000000000000000000");
        assert_eq!(fixed_point("1999.5"), "1999.5");

        let batch =
            ImportBatch::from_json(r#"{"orders": [{"id": "o1", "customer_id": "c1", "total_price": 1e-7}]}"#).unwrap();
        let lexical = batch.orders[0].total_price.as_ref().and_then(SourceValue::lexical).unwrap();
        assert_eq!(crate::core::Literal::decimal(&lexical).unwrap().lexical_form(), "0.0000001");
    }

    #[test]
    fn test_malformed_batch_is_import_error() {
        let err = ImportBatch::from_json(r#"{"brands": [{"name": "Apple"}]}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Import(_)));
    }

    #[test]
    fn test_missing_file_is_store_io() {
        let source = JsonFileSource::new("/nonexistent/gadgetstore/batch.json");
        assert!(matches!(source.fetch(), Err(CatalogError::StoreIo { .. })));
    }
}
