//! # Backend Module
//!
//! Contains all server logic for the studio desk.
//!
//! This module serves as the orchestration layer that brings together:
//! - **Domain**: Pricing, booking and finance rules
//! - **Storage**: SQLite repositories and the document store
//! - **IO**: REST API and the WhatsApp automation client
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! Web app
//!     ↓
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (Business logic, services)
//!     ↓
//! Storage Layer (SQLite, document files)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize the application state from an [`AppConfig`]
//! - Set up the REST API router with CORS and public document serving
//! - Coordinate between domain logic and data persistence

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

pub use config::AppConfig;

use crate::backend::domain::{
    AppointmentService, CatalogService, ClientService, DocumentService, ExportService,
    FinancialService, MessagingService, ProfileService, WhatsAppGateway,
};
use crate::backend::io::WhatsAppClient;
use crate::backend::storage::{DbConnection, DocumentStore, LocalDocumentStore};

/// Room for request framing on top of the largest accepted document
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub profile_service: ProfileService<DbConnection>,
    pub client_service: ClientService<DbConnection>,
    pub catalog_service: CatalogService<DbConnection>,
    pub appointment_service: AppointmentService<DbConnection>,
    pub financial_service: FinancialService<DbConnection>,
    pub export_service: ExportService<DbConnection>,
    pub document_service: DocumentService,
    pub messaging_service: MessagingService<DbConnection>,
}

impl AppState {
    /// Wire every service on top of an open database
    pub fn new(
        db_conn: Arc<DbConnection>,
        config: AppConfig,
        gateway: Option<Arc<dyn WhatsAppGateway>>,
    ) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(LocalDocumentStore::new(
            config.documents_dir.clone(),
            &config.public_base_url,
        ));
        let document_service = DocumentService::new(store, config.max_document_bytes);

        let profile_service = ProfileService::new(db_conn.clone());
        let client_service = ClientService::new(db_conn.clone());
        let catalog_service = CatalogService::new(db_conn.clone());
        let appointment_service =
            AppointmentService::new(db_conn.clone(), client_service.clone(), catalog_service.clone());
        let financial_service = FinancialService::new(db_conn.clone());
        let export_service = ExportService::new(db_conn);

        let messaging_service = MessagingService::new(
            gateway,
            &config.whatsapp.default_country_code,
            appointment_service.clone(),
            client_service.clone(),
            profile_service.clone(),
            document_service.clone(),
        );

        Self {
            config: Arc::new(config),
            profile_service,
            client_service,
            catalog_service,
            appointment_service,
            financial_service,
            export_service,
            document_service,
            messaging_service,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: AppConfig) -> Result<AppState> {
    info!("Setting up database");
    let db_conn = DbConnection::new(&config.database_url).await?;

    info!("Setting up document store at {:?}", config.documents_dir);
    tokio::fs::create_dir_all(&config.documents_dir)
        .await
        .with_context(|| format!("Failed to create documents dir {:?}", config.documents_dir))?;

    let gateway = match WhatsAppClient::from_config(&config.whatsapp)? {
        Some(client) => {
            info!("WhatsApp automation at {}", client.status_url());
            Some(Arc::new(client) as Arc<dyn WhatsAppGateway>)
        }
        None => {
            info!("No WhatsApp automation configured, messages use deep links");
            None
        }
    };

    info!("Setting up application state");
    Ok(AppState::new(Arc::new(db_conn), config, gateway))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = match config.cors_origin.as_deref() {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);
    let body_limit = app_state.config.max_document_bytes + BODY_LIMIT_SLACK;

    let api_routes = Router::new()
        .route("/profile", get(io::get_profile).put(io::upsert_profile))
        .route("/clients", get(io::list_clients).post(io::create_client))
        .route(
            "/clients/:id",
            get(io::get_client).put(io::update_client).delete(io::delete_client),
        )
        .route("/categories", get(io::list_categories).post(io::create_category))
        .route("/categories/:id", axum::routing::delete(io::delete_category))
        .route("/services", get(io::list_services).post(io::create_service))
        .route("/services/:id", axum::routing::put(io::update_service).delete(io::delete_service))
        .route("/areas", get(io::list_areas).post(io::create_area))
        .route("/areas/:id", axum::routing::put(io::update_area).delete(io::delete_area))
        .route(
            "/regional-prices",
            get(io::list_regional_prices).put(io::upsert_regional_price),
        )
        .route(
            "/regional-prices/:service_id/:area_id",
            axum::routing::delete(io::delete_regional_price),
        )
        .route("/quotes", post(io::calculate_quote))
        .route("/appointments", get(io::list_appointments).post(io::create_appointment))
        .route(
            "/appointments/:id",
            get(io::get_appointment).put(io::update_appointment),
        )
        .route("/appointments/:id/whatsapp", post(io::send_appointment_confirmation))
        .route("/finance/summary", get(io::get_financial_summary))
        .route("/finance/export", get(io::export_appointments))
        .route("/documents", get(io::list_documents))
        .route(
            "/documents/:name",
            get(io::download_document)
                .put(io::upload_document)
                .delete(io::delete_document),
        )
        .route("/documents/:name/url", get(io::get_document_url))
        .route("/documents/:name/whatsapp", post(io::share_document))
        .route("/whatsapp/status", get(io::get_whatsapp_status))
        .route("/whatsapp/send", post(io::send_whatsapp_message))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), io::require_api_key))
        .layer(DefaultBodyLimit::max(body_limit));

    let documents = ServeDir::new(app_state.config.documents_dir.clone());

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/documents", documents)
        .route("/health", get(health))
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const OWNER: &str = "owner-1";

    async fn test_app(api_key: Option<&str>) -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            api_key: api_key.map(str::to_string),
            documents_dir: dir.path().to_path_buf(),
            public_base_url: "http://localhost:3000".to_string(),
            ..AppConfig::default()
        };
        let db = Arc::new(DbConnection::init_test().await.unwrap());
        (create_router(AppState::new(db, config, None)), dir)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-owner-id", OWNER)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-owner-id", OWNER)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health_needs_no_owner() {
        let (app, _dir) = test_app(None).await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_owner_is_unauthorized() {
        let (app, _dir) = test_app(None).await;
        let request = Request::builder().uri("/api/clients").body(Body::empty()).unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing x-owner-id header");
    }

    #[tokio::test]
    async fn test_api_key_is_enforced_when_configured() {
        let (app, _dir) = test_app(Some("secret")).await;

        let (status, _) = send(&app, get_request("/api/clients")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut request = get_request("/api/clients");
        request
            .headers_mut()
            .insert("x-api-key", HeaderValue::from_static("secret"));
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clients"], json!([]));
    }

    #[tokio::test]
    async fn test_booking_flow_through_the_api() {
        let (app, _dir) = test_app(None).await;

        let (status, area) = send_json(
            &app,
            json_request("POST", "/api/areas", json!({ "name": "Centro", "travel_fee": 15.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, service) = send_json(
            &app,
            json_request(
                "POST",
                "/api/services",
                json!({ "name": "Escova", "category": "Cabelo", "standard_price": 100.0, "duration_minutes": 45 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let quote_input = json!({
            "services": [{ "service_id": service["id"], "quantity": 1 }],
            "area_id": area["id"],
            "include_travel_fee": true
        });
        let (status, quote) = send_json(&app, json_request("POST", "/api/quotes", quote_input.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["total"], 115.0);

        let mut booking = json!({
            "client": { "kind": "new", "name": "Ana", "phone": "11988887777" },
            "quote": quote_input,
            "is_confirmed": true,
            "address": "Rua A, 1",
            "scheduled_date": "2025-03-10",
            "scheduled_time": "14:30",
            "down_payment": "50,00"
        });
        let (status, gate) = send_json(&app, json_request("POST", "/api/appointments", booking.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(gate["outcome"], "payment_confirmation_required");

        booking["down_payment_confirmed"] = json!(true);
        let (status, created) = send_json(&app, json_request("POST", "/api/appointments", booking)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["outcome"], "created");
        assert_eq!(created["appointment"]["payment_status"], "partial");

        let (status, listed) = send_json(&app, get_request("/api/appointments?status=confirmed")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["appointments"].as_array().unwrap().len(), 1);

        let (status, summary) = send_json(&app, get_request("/api/finance/summary?today=2025-03-10")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["today"]["received"], 50.0);
        assert_eq!(summary["today"]["pending"], 65.0);

        let response = app.clone().oneshot(get_request("/api/finance/export")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
    }

    #[tokio::test]
    async fn test_validation_errors_list_details() {
        let (app, _dir) = test_app(None).await;
        let (status, body) = send_json(
            &app,
            json_request("POST", "/api/clients", json!({ "name": "", "phone": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_document_upload_and_public_serving() {
        let (app, _dir) = test_app(None).await;

        let upload = Request::builder()
            .method("PUT")
            .uri("/api/documents/Tabela%202025.pdf")
            .header("x-owner-id", OWNER)
            .body(Body::from("%PDF-1.4 test"))
            .unwrap();
        let (status, stored) = send_json(&app, upload).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(stored["name"], "Tabela_2025.pdf");

        let not_pdf = Request::builder()
            .method("PUT")
            .uri("/api/documents/notes.pdf")
            .header("x-owner-id", OWNER)
            .body(Body::from("plain text"))
            .unwrap();
        let (status, _) = send(&app, not_pdf).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let public = Request::builder()
            .uri("/documents/owner-1/Tabela_2025.pdf")
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = send(&app, public).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"%PDF-1.4 test");

        let (status, link) = send_json(&app, get_request("/api/whatsapp/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(link["ready"], false);
    }
}
