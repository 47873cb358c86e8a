//! # REST API for Quotes
//!
//! Runs the pricing engine against the owner's current catalog without
//! storing anything.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::QuoteInput;
use tracing::{info, warn};

use super::{ApiError, OwnerId};
use crate::backend::AppState;

pub async fn calculate_quote(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(input): Json<QuoteInput>,
) -> impl IntoResponse {
    info!("POST /api/quotes - owner {} request: {:?}", owner_id, input);

    match state.catalog_service.quote(&owner_id, &input).await {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(e) => {
            warn!("Quote rejected: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
