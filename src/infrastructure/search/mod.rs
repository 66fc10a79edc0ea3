use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::domain::enrichment::SearchHit;
use crate::domain::error::{AppError, Result};

const SERPER_URL: &str = "https://google.serper.dev/search";

/// Web search used as grounding context for the search-augmented
/// enrichment path. Returns ordered hits; an empty list is a valid
/// answer, not an error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Deserialize)]
struct SerperResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

#[derive(Debug)]
pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
}

impl SerperClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            AppError::ConfigError("SERPER_API_KEY is not configured".to_string())
        })?;

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_key,
        })
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let body = json!({ "q": query, "num": limit });

        let response = self
            .client
            .post(SERPER_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::SearchError(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::SearchError(format!(
                "Search API error ({}): {}",
                status, text
            )));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| AppError::SearchError(format!("Invalid search response: {}", e)))?;

        Ok(parsed
            .organic
            .into_iter()
            .take(limit)
            .map(|r| SearchHit {
                title: r.title.unwrap_or_default(),
                snippet: r.snippet.unwrap_or_default(),
                url: r.link.unwrap_or_default(),
            })
            .collect())
    }
}
