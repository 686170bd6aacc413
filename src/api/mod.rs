//! Tarifario HTTP API
//!
//! HTTP layer for Tarifario, built with Axum.
//!
//! # Endpoints
//!
//! ## Page
//! - `GET /` - Rendered price list with editable prices
//!
//! ## Catalog
//! - `GET /api/v1/catalog` - Tariff list
//! - `POST /api/v1/format` - Preview price formatting
//!
//! ## Form sessions
//! - `POST /api/v1/sessions` - Open a session
//! - `GET /api/v1/sessions/:id` - Session state
//! - `DELETE /api/v1/sessions/:id` - Close a session
//! - `PUT /api/v1/sessions/:id/edits/:code` - Record a proposed price
//! - `GET /api/v1/sessions/:id/changes` - Preview the change-set
//! - `POST /api/v1/sessions/:id/submit` - Submit the change-set
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use tarifario::api::{serve, ApiConfig, AppState};
//! use tarifario::catalog::PriceCatalog;
//! use tarifario::form::{FormConfig, FormRegistry, RegistryConfig};
//! use tarifario::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(FormRegistry::new(
//!         Arc::new(PriceCatalog::embedded()?),
//!         Arc::new(MemoryStore::new()),
//!         FormConfig::default(),
//!         RegistryConfig::default(),
//!     ));
//!     let config = ApiConfig::default();
//!
//!     serve(AppState::new(registry, config.clone()), &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Catalog routes
        .route("/catalog", get(routes::catalog::get_catalog))
        .route("/format", post(routes::catalog::format_price))
        // Session routes
        .route("/sessions", post(routes::sessions::open_session))
        .route(
            "/sessions/:id",
            get(routes::sessions::get_session).delete(routes::sessions::close_session),
        )
        .route("/sessions/:id/edits/:code", put(routes::sessions::record_edit))
        .route("/sessions/:id/changes", get(routes::sessions::preview_changes))
        .route("/sessions/:id/submit", post(routes::sessions::submit));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let body_limit = state.config.max_body_size;
    let timeout = state.config.request_timeout;

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::page::index))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Same-origin only unless origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

/// Start the HTTP server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Tarifario listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Tarifario shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PriceCatalog;
    use crate::form::{FormConfig, FormRegistry, RegistryConfig, FAILURE_MESSAGE};
    use crate::store::{
        MemoryStore, PriceStore, PriceUpdateRecord, StoreError, StoreResult, StoredRecord,
    };
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, Response, StatusCode},
    };
    use serde_json::Value;
    use tower::util::ServiceExt;

    struct FailingStore;

    #[async_trait]
    impl PriceStore for FailingStore {
        async fn append(&self, _record: &PriceUpdateRecord) -> StoreResult<StoredRecord> {
            Err(StoreError::ApiError {
                status: 403,
                message: "PERMISSION_DENIED".to_string(),
            })
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    fn create_test_app_with(store: Arc<dyn PriceStore>) -> Router {
        let registry = Arc::new(FormRegistry::new(
            Arc::new(PriceCatalog::embedded().unwrap()),
            store,
            FormConfig::default(),
            RegistryConfig::default(),
        ));
        build_router(AppState::new(registry, ApiConfig::default()))
    }

    fn create_test_app() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (create_test_app_with(store.clone()), store)
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn open_session(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(request("POST", "/api/v1/sessions", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _store) = create_test_app();

        let response = app
            .oneshot(request("GET", "/health/live", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _store) = create_test_app();

        let response = app
            .oneshot(request("GET", "/health/ready", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _store) = create_test_app();

        let response = app.oneshot(request("GET", "/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn test_catalog() {
        let (app, _store) = create_test_app();

        let response = app
            .oneshot(request("GET", "/api/v1/catalog", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["locale"], "es-CR");
        assert_eq!(body["sections"][0]["key"], "01_diagnostico");
        assert_eq!(body["sections"][0]["title"], "diagnostico");
        assert_eq!(body["sections"][0]["items"][0]["code"], "D0120");
        assert_eq!(body["sections"][0]["items"][0]["base_price_display"], "15\u{a0}000");
    }

    #[tokio::test]
    async fn test_format() {
        let (app, _store) = create_test_app();

        let response = app
            .oneshot(request("POST", "/api/v1/format", Some(r#"{"raw": "1a2b3"}"#)))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["digits"], "123");
        assert_eq!(body["display"], "123");
    }

    #[tokio::test]
    async fn test_edit_and_submit() {
        let (app, store) = create_test_app();
        let id = open_session(&app).await;

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/api/v1/sessions/{}/edits/D0120", id),
                Some(r#"{"raw": "₡25.000"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["edits"][0]["digits"], "25000");
        assert_eq!(body["can_submit"], true);

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/api/v1/sessions/{}/changes", id), None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["updates"][0]["servicio"], "Examen");

        let response = app
            .clone()
            .oneshot(request("POST", &format!("/api/v1/sessions/{}/submit", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["updates"][0]["codigo"], "D0120");
        assert_eq!(body["updates"][0]["monto_nuevo"], 25000);

        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].updates[0].new_price, 25000);

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/api/v1/sessions/{}", id), None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["edits"].as_array().unwrap().len(), 0);
        assert_eq!(body["status"]["kind"], "success");
    }

    #[tokio::test]
    async fn test_out_of_order_edits_keep_latest() {
        let (app, store) = create_test_app();
        let id = open_session(&app).await;
        let uri = format!("/api/v1/sessions/{}/edits/D0120", id);

        let response = app
            .clone()
            .oneshot(request("PUT", &uri, Some(r#"{"raw": "12", "seq": 2}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Sent earlier, arrives later
        let response = app
            .clone()
            .oneshot(request("PUT", &uri, Some(r#"{"raw": "1", "seq": 1}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["edits"][0]["digits"], "12");

        let response = app
            .clone()
            .oneshot(request("POST", &format!("/api/v1/sessions/{}/submit", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(store.records().await[0].updates[0].new_price, 12);
    }

    #[tokio::test]
    async fn test_empty_submit_rejected() {
        let (app, store) = create_test_app();
        let id = open_session(&app).await;

        let response = app
            .oneshot(request("POST", &format!("/api/v1/sessions/{}/submit", id), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "No hay cambios para enviar.");
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_generic() {
        let app = create_test_app_with(Arc::new(FailingStore));
        let id = open_session(&app).await;

        app.clone()
            .oneshot(request(
                "PUT",
                &format!("/api/v1/sessions/{}/edits/D0120", id),
                Some(r#"{"raw": "25000"}"#),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request("POST", &format!("/api/v1/sessions/{}/submit", id), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], FAILURE_MESSAGE);
        assert!(!body.to_string().contains("PERMISSION_DENIED"));

        let response = app
            .oneshot(request("GET", &format!("/api/v1/sessions/{}", id), None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["edits"][0]["digits"], "25000");
        assert_eq!(body["status"]["kind"], "error");
    }

    #[tokio::test]
    async fn test_unknown_item_code() {
        let (app, _store) = create_test_app();
        let id = open_session(&app).await;

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/api/v1/sessions/{}/edits/X9999", id),
                Some(r#"{"raw": "100"}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (app, _store) = create_test_app();

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/v1/sessions/{}", uuid::Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_close_session() {
        let (app, _store) = create_test_app();
        let id = open_session(&app).await;

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/api/v1/sessions/{}", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("DELETE", &format!("/api/v1/sessions/{}", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_invalid_json() {
        let (app, _store) = create_test_app();
        let id = open_session(&app).await;

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/api/v1/sessions/{}/edits/D0120", id),
                Some("not json"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_index_page() {
        let (app, _store) = create_test_app();

        let response = app.oneshot(request("GET", "/", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r##"href="#tarifas""##));
        assert!(html.contains(r#"data-code="D0120""#));
    }
}
