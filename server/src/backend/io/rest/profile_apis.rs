//! # REST API for the Operator Profile

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::UpsertProfileRequest;
use tracing::{error, info};

use super::{ApiError, OwnerId};
use crate::backend::AppState;

/// Get the profile of the signed-in operator
pub async fn get_profile(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/profile - owner {}", owner_id);

    match state.profile_service.get_profile(&owner_id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Create or replace the profile
pub async fn upsert_profile(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<UpsertProfileRequest>,
) -> impl IntoResponse {
    info!("PUT /api/profile - owner {} request: {:?}", owner_id, request);

    match state.profile_service.upsert_profile(&owner_id, request).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => {
            error!("Failed to save profile: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
