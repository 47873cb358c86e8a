//! # REST API for Appointments
//!
//! Booking flow, listing, editing and the WhatsApp confirmation message.
//!
//! `POST /api/appointments` answers with a tagged body: `"outcome":
//! "created"` (201) or `"outcome": "payment_confirmation_required"` (409).
//! In the second case nothing was stored and the client resubmits with
//! `down_payment_confirmed` set.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{AppointmentStatus, CreateAppointmentRequest, CreateAppointmentResponse, UpdateAppointmentRequest};
use tracing::{error, info};

use super::{ApiError, OwnerId};
use crate::backend::storage::AppointmentFilter;
use crate::backend::AppState;

/// `?status=confirmed&from=2025-03-01&to=2025-03-31`
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<AppointmentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl From<AppointmentListQuery> for AppointmentFilter {
    fn from(query: AppointmentListQuery) -> Self {
        AppointmentFilter {
            status: query.status,
            from: query.from,
            to: query.to,
        }
    }
}

pub async fn create_appointment(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<CreateAppointmentRequest>,
) -> impl IntoResponse {
    info!("POST /api/appointments - owner {} request: {:?}", owner_id, request);

    match state.appointment_service.create_appointment(&owner_id, request).await {
        Ok(response @ CreateAppointmentResponse::Created { .. }) => {
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Ok(response @ CreateAppointmentResponse::PaymentConfirmationRequired { .. }) => {
            info!("Appointment for owner {} waits for down payment confirmation", owner_id);
            (StatusCode::CONFLICT, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to create appointment: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn list_appointments(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<AppointmentListQuery>,
) -> impl IntoResponse {
    info!("GET /api/appointments - owner {} query: {:?}", owner_id, query);

    let filter = AppointmentFilter::from(query);
    match state.appointment_service.list_appointments(&owner_id, &filter).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list appointments: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn get_appointment(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(appointment_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/appointments/{} - owner {}", appointment_id, owner_id);

    match state.appointment_service.get_appointment(&owner_id, &appointment_id).await {
        Ok(appointment) => (StatusCode::OK, Json(appointment)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn update_appointment(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/appointments/{} - owner {} request: {:?}", appointment_id, owner_id, request);

    match state
        .appointment_service
        .update_appointment(&owner_id, &appointment_id, request)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to update appointment: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

/// Send the booking confirmation to the appointment's client
pub async fn send_appointment_confirmation(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(appointment_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/appointments/{}/whatsapp - owner {}", appointment_id, owner_id);

    match state
        .messaging_service
        .send_appointment_confirmation(&owner_id, &appointment_id)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to send appointment confirmation: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
