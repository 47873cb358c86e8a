//! # REST API for WhatsApp Messaging

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::SendWhatsAppRequest;
use tracing::{error, info};

use super::{ApiError, OwnerId};
use crate::backend::AppState;

/// Automation status; never fails, an unreachable process reports not ready
pub async fn get_whatsapp_status(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/whatsapp/status - owner {}", owner_id);
    (StatusCode::OK, Json(state.messaging_service.status().await))
}

pub async fn send_whatsapp_message(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<SendWhatsAppRequest>,
) -> impl IntoResponse {
    info!("POST /api/whatsapp/send - owner {} to {}", owner_id, request.phone);

    match state
        .messaging_service
        .send_message(&request.phone, &request.message)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to send WhatsApp message: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
