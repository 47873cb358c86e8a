//! # REST API for the Service Catalog
//!
//! Categories, services, service areas and regional price overrides.
//! List endpoints wrap their rows in `{"items": [...]}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{
    CatalogResponse, CreateCategoryRequest, ServiceAreaRequest, ServiceRequest,
    UpsertRegionalPriceRequest,
};
use tracing::{error, info};

use super::{ApiError, OwnerId};
use crate::backend::AppState;

fn listed<T: serde::Serialize>(result: anyhow::Result<Vec<T>>) -> axum::response::Response {
    match result {
        Ok(items) => (StatusCode::OK, Json(CatalogResponse { items })).into_response(),
        Err(e) => {
            error!("Failed to list catalog items: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

fn deleted(result: anyhow::Result<()>, what: &str) -> axum::response::Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to delete {}: {}", what, e);
            ApiError::from(e).into_response()
        }
    }
}

// -- categories -------------------------------------------------------------

pub async fn list_categories(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/categories - owner {}", owner_id);
    listed(state.catalog_service.list_categories(&owner_id).await)
}

pub async fn create_category(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    info!("POST /api/categories - owner {} request: {:?}", owner_id, request);

    match state.catalog_service.create_category(&owner_id, request).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => {
            error!("Failed to create category: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn delete_category(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(category_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/categories/{} - owner {}", category_id, owner_id);
    deleted(state.catalog_service.delete_category(&owner_id, &category_id).await, "category")
}

// -- services ---------------------------------------------------------------

pub async fn list_services(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/services - owner {}", owner_id);
    listed(state.catalog_service.list_services(&owner_id).await)
}

pub async fn create_service(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<ServiceRequest>,
) -> impl IntoResponse {
    info!("POST /api/services - owner {} request: {:?}", owner_id, request);

    match state.catalog_service.create_service(&owner_id, request).await {
        Ok(service) => (StatusCode::CREATED, Json(service)).into_response(),
        Err(e) => {
            error!("Failed to create service: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn update_service(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(service_id): Path<String>,
    Json(request): Json<ServiceRequest>,
) -> impl IntoResponse {
    info!("PUT /api/services/{} - owner {} request: {:?}", service_id, owner_id, request);

    match state.catalog_service.update_service(&owner_id, &service_id, request).await {
        Ok(service) => (StatusCode::OK, Json(service)).into_response(),
        Err(e) => {
            error!("Failed to update service: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn delete_service(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(service_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/services/{} - owner {}", service_id, owner_id);
    deleted(state.catalog_service.delete_service(&owner_id, &service_id).await, "service")
}

// -- areas ------------------------------------------------------------------

pub async fn list_areas(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/areas - owner {}", owner_id);
    listed(state.catalog_service.list_areas(&owner_id).await)
}

pub async fn create_area(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<ServiceAreaRequest>,
) -> impl IntoResponse {
    info!("POST /api/areas - owner {} request: {:?}", owner_id, request);

    match state.catalog_service.create_area(&owner_id, request).await {
        Ok(area) => (StatusCode::CREATED, Json(area)).into_response(),
        Err(e) => {
            error!("Failed to create area: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn update_area(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(area_id): Path<String>,
    Json(request): Json<ServiceAreaRequest>,
) -> impl IntoResponse {
    info!("PUT /api/areas/{} - owner {} request: {:?}", area_id, owner_id, request);

    match state.catalog_service.update_area(&owner_id, &area_id, request).await {
        Ok(area) => (StatusCode::OK, Json(area)).into_response(),
        Err(e) => {
            error!("Failed to update area: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn delete_area(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(area_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/areas/{} - owner {}", area_id, owner_id);
    deleted(state.catalog_service.delete_area(&owner_id, &area_id).await, "area")
}

// -- regional prices --------------------------------------------------------

pub async fn list_regional_prices(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/regional-prices - owner {}", owner_id);
    listed(state.catalog_service.list_regional_prices(&owner_id).await)
}

pub async fn upsert_regional_price(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<UpsertRegionalPriceRequest>,
) -> impl IntoResponse {
    info!("PUT /api/regional-prices - owner {} request: {:?}", owner_id, request);

    match state.catalog_service.upsert_regional_price(&owner_id, request).await {
        Ok(price) => (StatusCode::OK, Json(price)).into_response(),
        Err(e) => {
            error!("Failed to save regional price: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn delete_regional_price(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path((service_id, area_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/regional-prices/{}/{} - owner {}", service_id, area_id, owner_id);
    deleted(
        state
            .catalog_service
            .delete_regional_price(&owner_id, &service_id, &area_id)
            .await,
        "regional price",
    )
}
