//! # REST API for the Money Overview
//!
//! Financial summary and the CSV export of appointments.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

use super::{ApiError, OwnerId};
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// Reference day for the today/week/month windows; the server's local
    /// date when absent
    pub today: Option<NaiveDate>,
}

pub async fn get_financial_summary(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<SummaryQuery>,
) -> impl IntoResponse {
    info!("GET /api/finance/summary - owner {} query: {:?}", owner_id, query);

    match state.financial_service.summary(&owner_id, query.today).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            error!("Failed to build financial summary: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn export_appointments(State(state): State<AppState>, OwnerId(owner_id): OwnerId) -> impl IntoResponse {
    info!("GET /api/finance/export - owner {}", owner_id);

    match state.export_service.export_appointments_csv(&owner_id).await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"appointments.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to export appointments: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
