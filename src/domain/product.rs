use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

/// A catalog entry, keyed by SKU.
///
/// Every text field is stored upper-case so search can stay
/// case-insensitive without per-query collation. Optional fields are
/// `None` when unknown; an empty string is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    #[serde(rename = "SKU")]
    pub sku: String,

    #[serde(rename = "ITEMS_NAME")]
    pub items_name: String,

    /// Manufacturer / legal entity name (PT, CV, Corp, Ltd., ...).
    #[serde(rename = "CATEGORY")]
    pub category: Option<String>,

    #[serde(rename = "BRAND_NAME")]
    pub brand_name: Option<String>,

    /// Packaging unit, e.g. "PCS".
    #[serde(rename = "VARIANT_NAME")]
    pub variant_name: Option<String>,

    /// `None` means "price unknown", which is distinct from a zero price.
    #[serde(rename = "PRICE")]
    pub price: Option<f64>,
}

impl ProductRecord {
    /// Build a record from raw field values, applying the storage
    /// invariants: SKU and name are required, all text is upper-cased,
    /// blanks become `None`.
    pub fn new(
        sku: &str,
        items_name: &str,
        category: Option<&str>,
        brand_name: Option<&str>,
        variant_name: Option<&str>,
        price: Option<f64>,
    ) -> Result<Self> {
        let sku = normalize_required(sku)
            .ok_or_else(|| AppError::ValidationError("SKU is required".to_string()))?;
        let items_name = normalize_required(items_name)
            .ok_or_else(|| AppError::ValidationError("ITEMS_NAME is required".to_string()))?;

        Ok(Self {
            sku,
            items_name,
            category: category.and_then(normalize_optional),
            brand_name: brand_name.and_then(normalize_optional),
            variant_name: variant_name.and_then(normalize_optional),
            price,
        })
    }
}

/// Field set for a manual update, keyed externally by SKU.
///
/// Outer `None` means "leave the column alone"; inner `None` means
/// "set it to NULL". A blank input therefore clears a column instead of
/// silently disappearing from the update. `items_name` has no inner
/// option because the name is required and can never become NULL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductUpdate {
    pub items_name: Option<String>,
    pub category: Option<Option<String>>,
    pub brand_name: Option<Option<String>>,
    pub variant_name: Option<Option<String>>,
    pub price: Option<Option<f64>>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.items_name.is_none()
            && self.category.is_none()
            && self.brand_name.is_none()
            && self.variant_name.is_none()
            && self.price.is_none()
    }
}

/// Upper-case and trim; `None` when the input is blank.
pub fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

fn normalize_required(value: &str) -> Option<String> {
    normalize_optional(value)
}

/// Parse a price cell: blank means unknown (`None`), thousands
/// separators are tolerated. A non-blank, non-numeric value is an error
/// the caller decides how to handle.
pub fn parse_price(value: &str) -> Result<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .replace(',', "")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::ValidationError(format!("PRICE is not numeric: '{}'", trimmed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uppercases_and_nulls_blanks() {
        let record = ProductRecord::new(
            "abc-001",
            "kopi bubuk",
            Some(""),
            Some("kapal api"),
            None,
            Some(12500.0),
        )
        .unwrap();

        assert_eq!(record.sku, "ABC-001");
        assert_eq!(record.items_name, "KOPI BUBUK");
        assert_eq!(record.category, None);
        assert_eq!(record.brand_name, Some("KAPAL API".to_string()));
        assert_eq!(record.variant_name, None);
    }

    #[test]
    fn test_new_requires_sku_and_name() {
        assert!(ProductRecord::new("", "X", None, None, None, None).is_err());
        assert!(ProductRecord::new("X", "  ", None, None, None, None).is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("").unwrap(), None);
        assert_eq!(parse_price("  ").unwrap(), None);
        assert_eq!(parse_price("1500").unwrap(), Some(1500.0));
        assert_eq!(parse_price("1,500.50").unwrap(), Some(1500.50));
        assert!(parse_price("gratis").is_err());
    }

    #[test]
    fn test_zero_price_is_not_null() {
        assert_eq!(parse_price("0").unwrap(), Some(0.0));
    }
}
