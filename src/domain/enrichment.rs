use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::error::AppError;

/// Which external source answers an enrichment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Web search for the SKU first, then a model extracts fields
    /// strictly from the result snippets.
    SearchAugmented,
    Gemini,
    OpenAi,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "search" => Ok(ProviderKind::SearchAugmented),
            "gemini" => Ok(ProviderKind::Gemini),
            "chatgpt" | "openai" => Ok(ProviderKind::OpenAi),
            other => Err(AppError::ValidationError(format!(
                "Unknown enrichment provider: '{}'",
                other
            ))),
        }
    }
}

/// Best-effort field guesses for one SKU. Advisory only: never
/// persisted, the operator merges accepted fields into an update.
///
/// `None` means the provider could not verify the field. `price` is a
/// bare number as returned, not yet currency-normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentSuggestion {
    pub items_name: Option<String>,
    pub category: Option<String>,
    pub brand_name: Option<String>,
    pub variant_name: Option<String>,
    pub price: Option<f64>,
}

/// One web search result used as extraction context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}
