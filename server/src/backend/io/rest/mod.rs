//! # REST API Interface Layer
//!
//! Provides HTTP REST endpoints for the studio desk.
//! This layer handles:
//! - HTTP request/response serialization and deserialization
//! - Owner identification and the optional API key check
//! - Error translation from domain to HTTP status codes
//! - Request logging
//!
//! ## Authentication
//!
//! The upstream auth provider forwards the signed-in operator in the
//! `x-owner-id` header. Every `/api` handler takes [`OwnerId`], so a missing
//! or malformed header is answered with 401 before any domain call. When an
//! API key is configured, `/api` requests also need a matching `x-api-key`.
//!
//! ## Design Principles
//!
//! - **Domain Separation**: Pure translation layer without business logic
//! - **Consistent Errors**: Every failure body is an `ErrorResponse`

pub mod appointment_apis;
pub mod catalog_apis;
pub mod client_apis;
pub mod document_apis;
pub mod error;
pub mod finance_apis;
pub mod profile_apis;
pub mod quote_apis;
pub mod whatsapp_apis;

pub use appointment_apis::*;
pub use catalog_apis::*;
pub use client_apis::*;
pub use document_apis::*;
pub use error::ApiError;
pub use finance_apis::*;
pub use profile_apis::*;
pub use quote_apis::*;
pub use whatsapp_apis::*;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::backend::AppState;

pub const OWNER_HEADER: &str = "x-owner-id";
pub const API_KEY_HEADER: &str = "x-api-key";

const MAX_OWNER_ID_LEN: usize = 128;

/// Authenticated operator taken from the `x-owner-id` header
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerId(pub String);

fn is_valid_owner_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_OWNER_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or("");

        if value.is_empty() {
            return Err(ApiError::unauthorized("Missing x-owner-id header"));
        }
        if !is_valid_owner_id(value) {
            warn!("Rejected malformed owner id {:?}", value);
            return Err(ApiError::unauthorized("Invalid x-owner-id header"));
        }
        Ok(OwnerId(value.to_string()))
    }
}

/// Reject `/api` requests without the configured API key
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = state.config.api_key.as_deref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            warn!("Rejected {} {} - bad or missing API key", request.method(), request.uri().path());
            return ApiError::unauthorized("Invalid API key").into_response();
        }
    }
    next.run(request).await
}
