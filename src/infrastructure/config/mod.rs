use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::domain::error::{AppError, Result};

/// Process-wide configuration, read once at startup. Values come from
/// `warungdb.toml` overlaid with `WARUNGDB_*` environment variables
/// (`.env` is loaded by `main` before this runs).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Rows per store write. The importer never sends more than this in
    /// one request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub serper_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// How many search hits feed the search-augmented prompt.
    #[serde(default = "default_search_hits")]
    pub search_hits: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Figment::new()
            .merge(Toml::file("warungdb.toml"))
            .merge(Env::prefixed("WARUNGDB_").split("__"))
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            openai_api_key: None,
            serper_api_key: None,
            gemini_model: default_gemini_model(),
            openai_model: default_openai_model(),
            search_hits: default_search_hits(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://warungdb.sqlite".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_chunk_size() -> usize {
    500
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_search_hits() -> usize {
    5
}
