//! # REST API for Shared Documents
//!
//! Uploads take the raw PDF bytes as the request body; the file name comes
//! from the path and is sanitised before anything is written.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use shared::{DocumentListResponse, ShareDocumentRequest};
use tracing::{error, info};

use super::{ApiError, OwnerId};
use crate::backend::AppState;

pub async fn list_documents(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/documents - owner {}", owner_id);

    match state.document_service.list_documents(&owner_id).await {
        Ok(documents) => (StatusCode::OK, Json(DocumentListResponse { documents })).into_response(),
        Err(e) => {
            error!("Failed to list documents: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn upload_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(name): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    info!("PUT /api/documents/{} - owner {} ({} bytes)", name, owner_id, body.len());

    match state.document_service.upload_document(&owner_id, &name, &body).await {
        Ok(document) => (StatusCode::CREATED, Json(document)).into_response(),
        Err(e) => {
            error!("Failed to upload document: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn download_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(name): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/documents/{} - owner {}", name, owner_id);

    match state.document_service.download_document(&owner_id, &name).await {
        Ok(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, "application/pdf")], bytes).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn delete_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(name): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/documents/{} - owner {}", name, owner_id);

    match state.document_service.delete_document(&owner_id, &name).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to delete document: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn get_document_url(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(name): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/documents/{}/url - owner {}", name, owner_id);

    match state.document_service.document_url(&owner_id, &name).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Send the document's public link over WhatsApp
pub async fn share_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(name): Path<String>,
    Json(request): Json<ShareDocumentRequest>,
) -> impl IntoResponse {
    info!("POST /api/documents/{}/whatsapp - owner {} request: {:?}", name, owner_id, request);

    match state
        .messaging_service
        .share_document(&owner_id, &name, &request.phone)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to share document: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
