// ============================================================
// SUGGESTION PARSING
// ============================================================
// Providers answer in natural language around a JSON object. This
// module turns that text into a validated EnrichmentSuggestion or a
// hard parse failure; it never invents field values.

use serde_json::Value;

use crate::domain::enrichment::EnrichmentSuggestion;
use crate::domain::error::{AppError, Result};

/// Strip markdown fences and a leading `json` language tag, leaving
/// whatever payload the model produced.
pub fn extract_json_payload(output: &str) -> String {
    let trimmed = strip_code_fence(output.trim());
    if let Some(stripped) = trimmed.strip_prefix("json") {
        return stripped.trim().to_string();
    }
    trimmed
}

fn strip_code_fence(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(stripped) = trimmed.strip_prefix("```json") {
        return stripped.trim().trim_end_matches("```").trim().to_string();
    }
    if let Some(stripped) = trimmed.strip_prefix("```") {
        return stripped.trim().trim_end_matches("```").trim().to_string();
    }
    trimmed.to_string()
}

/// Parse provider output into the canonical suggestion shape.
///
/// The payload must be a single JSON object; anything else is a hard
/// failure, with no partial salvage. Fields that are absent, null, or
/// empty become `None`.
pub fn parse_suggestion(output: &str) -> Result<EnrichmentSuggestion> {
    let payload = extract_json_payload(output);
    let value: Value = serde_json::from_str(&payload).map_err(|e| {
        AppError::ParseError(format!("Provider response is not valid JSON: {}", e))
    })?;

    let object = value.as_object().ok_or_else(|| {
        AppError::ParseError("Provider response is not a JSON object".to_string())
    })?;

    Ok(EnrichmentSuggestion {
        items_name: text_field(object.get("items_name")),
        category: text_field(object.get("category")),
        brand_name: text_field(object.get("brand_name")),
        variant_name: text_field(object.get("variant_name")),
        price: price_field(object.get("price")),
    })
}

fn text_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A number, or a numeric string; everything else is "unknown", never a
/// defaulted zero.
fn price_field(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_object() {
        let suggestion = parse_suggestion(
            r#"{"items_name":"Kopi ABC","category":"PT Santos","brand_name":"ABC","variant_name":"PCS","price":1500}"#,
        )
        .unwrap();

        assert_eq!(suggestion.items_name, Some("Kopi ABC".to_string()));
        assert_eq!(suggestion.category, Some("PT Santos".to_string()));
        assert_eq!(suggestion.price, Some(1500.0));
    }

    #[test]
    fn test_strips_code_fences() {
        let fenced = "```json\n{\"items_name\": \"Kopi ABC\"}\n```";
        let suggestion = parse_suggestion(fenced).unwrap();
        assert_eq!(suggestion.items_name, Some("Kopi ABC".to_string()));
    }

    #[test]
    fn test_leading_language_tag() {
        let tagged = "json{\"items_name\": \"Kopi ABC\"}";
        let suggestion = parse_suggestion(tagged).unwrap();
        assert_eq!(suggestion.items_name, Some("Kopi ABC".to_string()));
    }

    #[test]
    fn test_missing_fields_become_none_not_error() {
        let suggestion = parse_suggestion(r#"{"items_name":"Kopi ABC"}"#).unwrap();
        assert_eq!(suggestion.brand_name, None);
        assert_eq!(suggestion.category, None);
        assert_eq!(suggestion.price, None);
    }

    #[test]
    fn test_empty_strings_become_none() {
        let suggestion =
            parse_suggestion(r#"{"items_name":"", "brand_name":"  ", "price":""}"#).unwrap();
        assert_eq!(suggestion.items_name, None);
        assert_eq!(suggestion.brand_name, None);
        assert_eq!(suggestion.price, None);
    }

    #[test]
    fn test_numeric_string_price_is_coerced() {
        let suggestion = parse_suggestion(r#"{"price":"12,500"}"#).unwrap();
        assert_eq!(suggestion.price, Some(12500.0));
    }

    #[test]
    fn test_prose_is_a_hard_failure() {
        let err = parse_suggestion("I could not find this product.").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_json_array_is_rejected() {
        let err = parse_suggestion(r#"[{"items_name":"X"}]"#).unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
