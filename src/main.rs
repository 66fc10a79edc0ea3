use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::error;

use warungdb::application::{CatalogUseCase, EnrichProductUseCase, ImportProductsUseCase};
use warungdb::domain::error::{AppError, Result};
use warungdb::infrastructure::config::{AppConfig, EnrichmentConfig};
use warungdb::infrastructure::db::{CatalogStore, SqliteCatalogRepository};
use warungdb::infrastructure::llm_clients::{GeminiClient, LlmClient, OpenAiClient};
use warungdb::infrastructure::search::{SearchProvider, SerperClient};
use warungdb::interfaces::http::{run_server, AppState};

#[actix_web::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load()?;
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let path = args.get(2).ok_or_else(|| {
                AppError::ConfigError("usage: warungdb import <file.csv>".to_string())
            })?;
            let store = init_store(&config).await?;
            let import = ImportProductsUseCase::new(store, config.import.chunk_size);
            let summary = import.run(Path::new(path)).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&summary)
                    .map_err(|e| AppError::Internal(e.to_string()))?
            );
            Ok(())
        }
        Some("serve") | None => {
            let store = init_store(&config).await?;
            let state = AppState {
                catalog: CatalogUseCase::new(store),
                enrich: build_enrichment(&config.enrichment)?,
            };
            run_server(state, &config.http.host, config.http.port)
                .await
                .map_err(|e| AppError::IoError(e.to_string()))
        }
        Some(other) => Err(AppError::ConfigError(format!(
            "unknown command '{}' (expected 'serve' or 'import')",
            other
        ))),
    }
}

async fn init_store(config: &AppConfig) -> Result<Arc<dyn CatalogStore>> {
    let repo = SqliteCatalogRepository::init(&config.database_url).await?;
    Ok(Arc::new(repo))
}

/// Construct only the providers that have credentials. Selecting an
/// unconfigured provider later fails with a configuration error before
/// any outbound call.
fn build_enrichment(config: &EnrichmentConfig) -> Result<EnrichProductUseCase> {
    let gemini: Option<Arc<dyn LlmClient>> = match &config.gemini_api_key {
        Some(_) => Some(Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )?)),
        None => None,
    };
    let openai: Option<Arc<dyn LlmClient>> = match &config.openai_api_key {
        Some(_) => Some(Arc::new(OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
        )?)),
        None => None,
    };
    let search: Option<Arc<dyn SearchProvider>> = match &config.serper_api_key {
        Some(_) => Some(Arc::new(SerperClient::new(config.serper_api_key.clone())?)),
        None => None,
    };

    Ok(EnrichProductUseCase::new(
        gemini,
        openai,
        search,
        config.search_hits,
    ))
}
