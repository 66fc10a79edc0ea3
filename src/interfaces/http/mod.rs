use actix_cors::Cors;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use tracing::info;

use crate::application::use_cases::catalog::ProductForm;
use crate::application::{CatalogUseCase, EnrichProductUseCase};
use crate::domain::enrichment::ProviderKind;
use crate::domain::error::AppError;

pub struct AppState {
    pub catalog: CatalogUseCase,
    pub enrich: EnrichProductUseCase,
}

/// Every failure path carries a distinct reason; a success is never
/// shaped like an error.
fn error_response(err: &AppError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        AppError::ValidationError(_) | AppError::ParseError(_) => {
            HttpResponse::BadRequest().json(body)
        }
        AppError::NotFound(_) => HttpResponse::NotFound().json(body),
        AppError::LlmError(_) | AppError::SearchError(_) => {
            HttpResponse::BadGateway().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[get("/api/search")]
async fn search(data: web::Data<AppState>, params: web::Query<SearchParams>) -> impl Responder {
    match data.catalog.search(&params.q).await {
        Ok(products) => HttpResponse::Ok().json(products),
        Err(e) => error_response(&e),
    }
}

#[post("/api/add_product")]
async fn add_product(
    data: web::Data<AppState>,
    form: web::Json<ProductForm>,
) -> impl Responder {
    match data.catalog.add(&form).await {
        Ok(record) => HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "data": [record],
        })),
        Err(e) => error_response(&e),
    }
}

#[put("/api/update_product")]
async fn update_product(
    data: web::Data<AppState>,
    form: web::Json<ProductForm>,
) -> impl Responder {
    match data.catalog.update(&form).await {
        Ok(record) => HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "data": [record],
        })),
        Err(e) => error_response(&e),
    }
}

#[derive(Deserialize)]
struct EnrichParams {
    sku: Option<String>,
    name_hint: Option<String>,
    provider: Option<String>,
}

#[get("/api/enrich_with_ai")]
async fn enrich_with_ai(
    data: web::Data<AppState>,
    params: web::Query<EnrichParams>,
) -> impl Responder {
    let sku = match params.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(sku) => sku,
        None => {
            return error_response(&AppError::ValidationError("SKU is required".to_string()))
        }
    };

    let provider = match params
        .provider
        .as_deref()
        .unwrap_or("gemini")
        .parse::<ProviderKind>()
    {
        Ok(provider) => provider,
        Err(e) => return error_response(&e),
    };

    match data
        .enrich
        .enrich(sku, params.name_hint.as_deref(), provider)
        .await
    {
        Ok(suggestion) => HttpResponse::Ok().json(suggestion),
        Err(e) => error_response(&e),
    }
}

pub async fn run_server(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    info!(host, port, "starting HTTP server");
    let state = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .service(search)
            .service(add_product)
            .service(update_product)
            .service(enrich_with_ai)
    })
    .bind((host.to_string(), port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, test};
    use std::sync::Arc;

    use crate::infrastructure::db::SqliteCatalogRepository;

    async fn state() -> web::Data<AppState> {
        let repo = Arc::new(
            SqliteCatalogRepository::init("sqlite::memory:")
                .await
                .unwrap(),
        );
        web::Data::new(AppState {
            catalog: CatalogUseCase::new(repo),
            enrich: EnrichProductUseCase::new(None, None, None, 5),
        })
    }

    #[actix_web::test]
    async fn test_add_then_search_roundtrip() {
        let app = test::init_service(
            App::new()
                .app_data(state().await)
                .service(search)
                .service(add_product),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/add_product")
            .set_json(serde_json::json!({
                "SKU": "abc-1",
                "ITEMS_NAME": "kopi",
                "PRICE": ""
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get()
            .uri("/api/search?q=abc")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body = to_bytes(resp.into_body()).await.unwrap();
        let products: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(products[0]["SKU"], "ABC-1");
        assert_eq!(products[0]["PRICE"], serde_json::Value::Null);
    }

    #[actix_web::test]
    async fn test_unknown_provider_is_bad_request() {
        let app = test::init_service(App::new().app_data(state().await).service(enrich_with_ai))
            .await;

        let req = test::TestRequest::get()
            .uri("/api/enrich_with_ai?sku=X1&provider=bard")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_unconfigured_provider_reports_config_error() {
        let app = test::init_service(App::new().app_data(state().await).service(enrich_with_ai))
            .await;

        let req = test::TestRequest::get()
            .uri("/api/enrich_with_ai?sku=X1&provider=gemini")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
    }
}
