//! # REST API for Client Management
//!
//! Endpoints for creating, retrieving, updating, and deleting clients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{CreateClientRequest, UpdateClientRequest};
use tracing::{error, info};

use super::{ApiError, OwnerId};
use crate::backend::AppState;

/// Create a new client
pub async fn create_client(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<CreateClientRequest>,
) -> impl IntoResponse {
    info!("POST /api/clients - owner {} request: {:?}", owner_id, request);

    match state.client_service.create_client(&owner_id, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to create client: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

/// Get a client by ID
pub async fn get_client(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(client_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/clients/{} - owner {}", client_id, owner_id);

    match state.client_service.get_client(&owner_id, &client_id).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// List all clients
pub async fn list_clients(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/clients - owner {}", owner_id);

    match state.client_service.list_clients(&owner_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list clients: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

/// Update a client
pub async fn update_client(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(client_id): Path<String>,
    Json(request): Json<UpdateClientRequest>,
) -> impl IntoResponse {
    info!("PUT /api/clients/{} - owner {} request: {:?}", client_id, owner_id, request);

    match state.client_service.update_client(&owner_id, &client_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to update client: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

/// Delete a client
pub async fn delete_client(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(client_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/clients/{} - owner {}", client_id, owner_id);

    match state.client_service.delete_client(&owner_id, &client_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to delete client: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
