use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::product::{normalize_optional, parse_price, ProductRecord, ProductUpdate};
use crate::infrastructure::db::{CatalogStore, SearchQuery, UpdateOutcome};

/// A price as entered by an operator: a number, or free text that still
/// has to be coerced. A blank string means "unknown", stored as NULL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

fn coerce_price(input: &Option<PriceInput>) -> Result<Option<f64>> {
    match input {
        None => Ok(None),
        Some(PriceInput::Number(n)) => Ok(Some(*n)),
        Some(PriceInput::Text(raw)) => parse_price(raw),
    }
}

/// Manual add/edit payload. Every field is optional at the wire level;
/// required-ness is checked per operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(rename = "SKU", alias = "sku")]
    pub sku: Option<String>,
    #[serde(rename = "ITEMS_NAME", alias = "items_name")]
    pub items_name: Option<String>,
    #[serde(rename = "CATEGORY", alias = "category")]
    pub category: Option<String>,
    #[serde(rename = "BRAND_NAME", alias = "brand_name")]
    pub brand_name: Option<String>,
    #[serde(rename = "VARIANT_NAME", alias = "variant_name")]
    pub variant_name: Option<String>,
    #[serde(rename = "PRICE", alias = "price")]
    pub price: Option<PriceInput>,
}

/// Search and manual CRUD over the catalog. Validation happens here,
/// before any store call.
pub struct CatalogUseCase {
    store: Arc<dyn CatalogStore>,
}

impl CatalogUseCase {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Incremental search; `*` returns the whole catalog, an empty
    /// query returns nothing.
    pub async fn search(&self, raw_query: &str) -> Result<Vec<ProductRecord>> {
        if raw_query.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.store.search(&SearchQuery::parse(raw_query)).await
    }

    pub async fn add(&self, form: &ProductForm) -> Result<ProductRecord> {
        let sku = form.sku.as_deref().unwrap_or("");
        let items_name = form.items_name.as_deref().unwrap_or("");
        let price = coerce_price(&form.price)?;

        let record = ProductRecord::new(
            sku,
            items_name,
            form.category.as_deref(),
            form.brand_name.as_deref(),
            form.variant_name.as_deref(),
            price,
        )?;

        self.store.insert(&record).await?;
        info!(sku = %record.sku, "product added");
        Ok(record)
    }

    /// Full-field replace keyed by SKU. Returns the stored record after
    /// the update so the caller sees exactly what the catalog holds.
    pub async fn update(&self, form: &ProductForm) -> Result<ProductRecord> {
        let sku = form
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::ValidationError("SKU is required".to_string()))?
            .to_uppercase();

        let items_name = match form.items_name.as_deref() {
            None => None,
            Some(raw) => Some(normalize_optional(raw).ok_or_else(|| {
                AppError::ValidationError("ITEMS_NAME cannot be blank".to_string())
            })?),
        };

        // A provided blank clears the column (inner None -> NULL); an
        // absent field leaves the column alone.
        let update = ProductUpdate {
            items_name,
            category: form.category.as_deref().map(normalize_optional),
            brand_name: form.brand_name.as_deref().map(normalize_optional),
            variant_name: form.variant_name.as_deref().map(normalize_optional),
            price: match &form.price {
                None => None,
                Some(_) => Some(coerce_price(&form.price)?),
            },
        };

        if update.is_empty() {
            return Err(AppError::ValidationError(
                "Update contains no fields".to_string(),
            ));
        }

        match self.store.update_by_key(&sku, &update).await? {
            UpdateOutcome::Updated(record) => {
                info!(sku = %record.sku, "product updated");
                Ok(record)
            }
            UpdateOutcome::Unchanged => self.store.get(&sku).await?.ok_or_else(|| {
                AppError::NotFound(format!("Product '{}' disappeared during update", sku))
            }),
            UpdateOutcome::NotFound => Err(AppError::NotFound(format!(
                "No product with SKU '{}'",
                sku
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::SqliteCatalogRepository;

    async fn use_case() -> CatalogUseCase {
        let repo = SqliteCatalogRepository::init("sqlite::memory:")
            .await
            .unwrap();
        CatalogUseCase::new(Arc::new(repo))
    }

    fn form(sku: &str, name: &str, price: Option<PriceInput>) -> ProductForm {
        ProductForm {
            sku: Some(sku.to_string()),
            items_name: Some(name.to_string()),
            price,
            ..Default::default()
        }
    }

    #[test]
    fn test_price_input_deserializes_from_number_and_string() {
        let number: PriceInput = serde_json::from_str("1500").unwrap();
        assert_eq!(number, PriceInput::Number(1500.0));
        let text: PriceInput = serde_json::from_str("\"\"").unwrap();
        assert_eq!(text, PriceInput::Text(String::new()));
    }

    #[tokio::test]
    async fn test_add_and_search_case_insensitive() {
        let uc = use_case().await;
        uc.add(&form("abc-1", "kopi hitam", Some(PriceInput::Number(1500.0))))
            .await
            .unwrap();

        // Mixed-case query finds the upper-cased row.
        let hits = uc.search("AbC").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "ABC-1");

        assert!(uc.search("  ").await.unwrap().is_empty());
        assert_eq!(uc.search("*").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_missing_required_fields() {
        let uc = use_case().await;
        let err = uc
            .add(&ProductForm {
                sku: Some("A1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_add_rejects_non_numeric_price() {
        let uc = use_case().await;
        let err = uc
            .add(&form("A1", "KOPI", Some(PriceInput::Text("mahal".to_string()))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_blank_price_becomes_null() {
        let uc = use_case().await;
        uc.add(&form("A1", "KOPI", Some(PriceInput::Number(1500.0))))
            .await
            .unwrap();

        let updated = uc
            .update(&form("a1", "KOPI", Some(PriceInput::Text(String::new()))))
            .await
            .unwrap();
        assert_eq!(updated.price, None);
    }

    #[tokio::test]
    async fn test_update_missing_key_is_not_found() {
        let uc = use_case().await;
        let err = uc
            .update(&form("GHOST", "X", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_blank_optional_field_clears_it() {
        let uc = use_case().await;
        uc.add(&ProductForm {
            sku: Some("A1".to_string()),
            items_name: Some("KOPI".to_string()),
            brand_name: Some("KAPAL API".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let updated = uc
            .update(&ProductForm {
                sku: Some("A1".to_string()),
                brand_name: Some("".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.brand_name, None);
    }
}
