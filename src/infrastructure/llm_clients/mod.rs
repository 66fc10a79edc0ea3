pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use async_trait::async_trait;

use crate::domain::error::Result;

/// Deterministic-leaning completion setting shared by both providers:
/// enrichment wants reproducible field extraction, not creativity.
pub const ENRICH_TEMPERATURE: f64 = 0.2;

/// One language-model provider. Credentials are checked at
/// construction, so an instance can always attempt a call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}
