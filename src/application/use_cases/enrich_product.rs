use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use super::suggestion::parse_suggestion;
use crate::domain::enrichment::{EnrichmentSuggestion, ProviderKind, SearchHit};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::llm_clients::LlmClient;
use crate::infrastructure::search::SearchProvider;

const SYSTEM_PROMPT: &str =
    "You are an accurate product data assistant that only outputs a single JSON object.";

/// Best-effort field lookup for one SKU. Providers are injected; a
/// request for a provider that has no configured credentials fails
/// before any outbound call.
pub struct EnrichProductUseCase {
    gemini: Option<Arc<dyn LlmClient>>,
    openai: Option<Arc<dyn LlmClient>>,
    search: Option<Arc<dyn SearchProvider>>,
    search_hits: usize,
}

impl EnrichProductUseCase {
    pub fn new(
        gemini: Option<Arc<dyn LlmClient>>,
        openai: Option<Arc<dyn LlmClient>>,
        search: Option<Arc<dyn SearchProvider>>,
        search_hits: usize,
    ) -> Self {
        Self {
            gemini,
            openai,
            search,
            search_hits: search_hits.max(1),
        }
    }

    pub async fn enrich(
        &self,
        sku: &str,
        name_hint: Option<&str>,
        provider: ProviderKind,
    ) -> Result<EnrichmentSuggestion> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Err(AppError::ValidationError("SKU is required".to_string()));
        }

        info!(sku, ?provider, "enrichment requested");
        let response = match provider {
            ProviderKind::Gemini => {
                let client = self.require_llm(&self.gemini, "Gemini")?;
                client
                    .generate(SYSTEM_PROMPT, &direct_prompt(sku, name_hint))
                    .await?
            }
            ProviderKind::OpenAi => {
                let client = self.require_llm(&self.openai, "OpenAI")?;
                client
                    .generate(SYSTEM_PROMPT, &direct_prompt(sku, name_hint))
                    .await?
            }
            ProviderKind::SearchAugmented => {
                let search = self.search.as_ref().ok_or_else(|| {
                    AppError::ConfigError("Search provider is not configured".to_string())
                })?;
                let hits = search.search(sku, self.search_hits).await?;
                if hits.is_empty() {
                    return Err(AppError::NotFound(format!(
                        "No web search results for SKU '{}'",
                        sku
                    )));
                }
                // The extraction model is whichever direct client is
                // configured, Gemini preferred.
                let client = self
                    .gemini
                    .as_ref()
                    .or(self.openai.as_ref())
                    .ok_or_else(|| {
                        AppError::ConfigError(
                            "Search-augmented enrichment needs a configured LLM provider"
                                .to_string(),
                        )
                    })?;
                client
                    .generate(SYSTEM_PROMPT, &search_prompt(sku, &hits))
                    .await?
            }
        };

        parse_suggestion(&response)
    }

    fn require_llm<'a>(
        &self,
        client: &'a Option<Arc<dyn LlmClient>>,
        name: &str,
    ) -> Result<&'a Arc<dyn LlmClient>> {
        client.as_ref().ok_or_else(|| {
            AppError::ConfigError(format!("{} provider is not configured", name))
        })
    }
}

const FIELD_CONTRACT: &str = "Return one JSON object with lower snake_case fields \
'items_name', 'category', 'brand_name', 'variant_name' and a numeric 'price'. \
For 'category', use the legal manufacturer name (PT, CV, Corp, Ltd., etc.). \
Output only the JSON object, with no markdown formatting and no extra text.";

fn direct_prompt(sku: &str, name_hint: Option<&str>) -> String {
    let mut prompt = format!(
        "Provide product data for the product with SKU/barcode '{}'",
        sku
    );
    if let Some(hint) = name_hint.map(str::trim).filter(|h| !h.is_empty()) {
        let _ = write!(prompt, " with a product name similar to '{}'", hint);
    }
    prompt.push_str(".\n");
    prompt.push_str(FIELD_CONTRACT);
    prompt.push_str(
        "\nIMPORTANT: if you cannot find verified, fully accurate information for a \
         field, you MUST return an empty string \"\" for that field. DO NOT GUESS \
         and do not fabricate information.",
    );
    prompt
}

fn search_prompt(sku: &str, hits: &[SearchHit]) -> String {
    let mut context = String::new();
    for (index, hit) in hits.iter().enumerate() {
        let _ = write!(
            context,
            "{}. {}\n   {}\n   {}\n",
            index + 1,
            hit.title,
            hit.snippet,
            hit.url
        );
    }

    format!(
        "Below are web search results for the product with SKU/barcode '{}'.\n\n\
         {}\n\
         Extract product data strictly from these results. Do not use any outside \
         knowledge. {}\nIf the results do not verify a field, return an empty \
         string \"\" for it.",
        sku, context, FIELD_CONTRACT
    )
}
