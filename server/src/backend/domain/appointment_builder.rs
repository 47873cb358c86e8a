//! # Appointment Record Builder
//!
//! Turns a priced quote plus the schedule and payment fields of the booking
//! form into a persistable [`Appointment`], and applies edits to an existing
//! one. Everything here is pure; the appointment service does the I/O.
//!
//! ## Rules
//!
//! - Unconfirmed bookings are `pending` with no schedule.
//! - Confirmed bookings need address, date and time, and carry a down payment.
//! - Payment status follows the amount received (see [`derive_payment_status`]).
//! - Moving an appointment to `completed` marks it fully paid.
//! - The duplicate guard compares (service, quantity) pairs of non-cancelled
//!   appointments for the same client and area.

use chrono::{NaiveDate, NaiveTime};
use shared::{
    Appointment, AppointmentServiceLine, AppointmentStatus, ClientSelection,
    CreateAppointmentRequest, PaymentStatus, Quote, UpdateAppointmentRequest,
};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::domain::money::{parse_amount, round_cents};
use crate::backend::domain::pricing::parse_manual_price;

pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppointmentError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("An identical appointment already exists for this client and area")]
    Duplicate,
    #[error("Appointment not found: {0}")]
    NotFound(String),
    #[error("Client not found: {0}")]
    ClientNotFound(String),
}

/// Check the booking form before anything touches the store
pub fn validate_create_request(request: &CreateAppointmentRequest) -> Result<(), AppointmentError> {
    let mut errors = Vec::new();

    match &request.client {
        ClientSelection::Existing { client_id } => {
            if client_id.trim().is_empty() {
                errors.push("Select a client".to_string());
            }
        }
        ClientSelection::New(client) => {
            if client.name.trim().is_empty() {
                errors.push("Client name is required".to_string());
            }
            if client.phone.trim().is_empty() {
                errors.push("Client phone is required".to_string());
            }
        }
    }

    if request.quote.area_id.as_deref().map_or(true, |a| a.trim().is_empty()) {
        errors.push("Select a service area".to_string());
    }

    if request.quote.use_manual_price {
        if let Err(e) = parse_manual_price(request.quote.manual_price.as_deref()) {
            errors.push(e.to_string());
        }
    } else if request.quote.services.is_empty() {
        errors.push("Select at least one service".to_string());
    }

    if request.is_confirmed {
        if is_blank(request.address.as_deref()) {
            errors.push("Address is required for a confirmed appointment".to_string());
        }
        if request.scheduled_date.is_none() {
            errors.push("Date is required for a confirmed appointment".to_string());
        }
        match request.scheduled_time.as_deref().map(str::trim) {
            None | Some("") => errors.push("Time is required for a confirmed appointment".to_string()),
            Some(time) if parse_time(time).is_none() => {
                errors.push(format!("Invalid time {:?}, use HH:MM", time))
            }
            Some(_) => {}
        }
        if let Err(message) = down_payment_amount(request) {
            errors.push(message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppointmentError::Validation(errors))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

/// Normalise "9:05" style input to "09:05"
fn normalize_time(value: &str) -> Option<String> {
    parse_time(value.trim()).map(|t| t.format(TIME_FORMAT).to_string())
}

/// Down payment typed on the confirmation form; empty means nothing received
pub fn down_payment_amount(request: &CreateAppointmentRequest) -> Result<f64, String> {
    match request.down_payment.as_deref().map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(raw) => match parse_amount(raw) {
            Ok(amount) if amount >= 0.0 => Ok(amount),
            _ => Err(format!("Invalid down payment: {}", raw)),
        },
    }
}

/// Payment status from the amount collected so far
pub fn derive_payment_status(total: f64, received: f64) -> PaymentStatus {
    if total <= 0.0 || received >= total {
        PaymentStatus::Paid
    } else if received > 0.0 {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

/// Amount the operator has to confirm before a confirmed booking is stored.
/// `None` when nothing is pending confirmation.
pub fn pending_payment_confirmation(request: &CreateAppointmentRequest, down_payment: f64) -> Option<f64> {
    if request.is_confirmed && down_payment > 0.0 && !request.down_payment_confirmed {
        Some(down_payment)
    } else {
        None
    }
}

/// Build the appointment row and its price snapshot lines
pub fn build_appointment(
    owner_id: &str,
    client_id: &str,
    request: &CreateAppointmentRequest,
    quote: &Quote,
    down_payment: f64,
    now: &str,
) -> Appointment {
    let id = Uuid::new_v4().to_string();

    // manual pricing keeps a single total, no lines
    let services = if quote.manual_price {
        Vec::new()
    } else {
        quote
            .lines
            .iter()
            .map(|line| AppointmentServiceLine {
                id: Uuid::new_v4().to_string(),
                appointment_id: id.clone(),
                service_id: line.service_id.clone(),
                service_name: line.service_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                total_price: line.total_price,
            })
            .collect()
    };

    let address = request
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let (status, scheduled_date, scheduled_time, amount_received, payment_status) =
        if request.is_confirmed {
            let received = round_cents(down_payment);
            (
                AppointmentStatus::Confirmed,
                request.scheduled_date,
                request.scheduled_time.as_deref().and_then(normalize_time),
                received,
                derive_payment_status(quote.total, received),
            )
        } else {
            (AppointmentStatus::Pending, None, None, 0.0, PaymentStatus::Pending)
        };

    Appointment {
        id,
        owner_id: owner_id.to_string(),
        client_id: client_id.to_string(),
        area_id: request.quote.area_id.clone().unwrap_or_default(),
        scheduled_date,
        scheduled_time,
        status,
        address,
        services,
        use_manual_price: quote.manual_price,
        include_travel_fee: request.quote.include_travel_fee,
        travel_fee: quote.travel_fee,
        total_value: quote.total,
        amount_received,
        payment_status,
        total_duration_minutes: quote.total_duration_minutes,
        notes: request.notes.clone().filter(|n| !n.trim().is_empty()),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}

/// Sorted (service id, quantity) pairs identifying a selection
pub fn service_signature(lines: &[AppointmentServiceLine]) -> Vec<(String, u32)> {
    let mut signature: Vec<(String, u32)> = lines
        .iter()
        .map(|l| (l.service_id.clone(), l.quantity))
        .collect();
    signature.sort();
    signature
}

/// Whether `candidate` repeats one of the non-cancelled `existing` appointments
pub fn is_duplicate(existing: &[Appointment], candidate: &Appointment) -> bool {
    if candidate.use_manual_price {
        return false;
    }
    let signature = service_signature(&candidate.services);
    existing
        .iter()
        .filter(|a| a.status != AppointmentStatus::Cancelled && a.id != candidate.id)
        .any(|a| service_signature(&a.services) == signature)
}

/// Apply an edit in place. Payment status is re-derived from the amount
/// received; a completed appointment is always fully paid.
pub fn apply_update(
    appointment: &mut Appointment,
    request: &UpdateAppointmentRequest,
    now: &str,
) -> Result<(), AppointmentError> {
    let mut errors = Vec::new();

    let scheduled_time = match request.scheduled_time.as_deref() {
        Some(raw) if raw.trim().is_empty() => Some(None),
        Some(raw) => match normalize_time(raw) {
            Some(time) => Some(Some(time)),
            None => {
                errors.push(format!("Invalid time {:?}, use HH:MM", raw));
                None
            }
        },
        None => None,
    };

    if let Some(received) = request.amount_received {
        if !received.is_finite() || received < 0.0 {
            errors.push("Amount received cannot be negative".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(AppointmentError::Validation(errors));
    }

    if let Some(status) = request.status {
        appointment.status = status;
    }
    if let Some(date) = request.scheduled_date {
        appointment.scheduled_date = Some(date);
    }
    if let Some(time) = scheduled_time {
        appointment.scheduled_time = time;
    }
    if let Some(address) = &request.address {
        let address = address.trim();
        appointment.address = (!address.is_empty()).then(|| address.to_string());
    }
    if let Some(notes) = &request.notes {
        appointment.notes = (!notes.trim().is_empty()).then(|| notes.clone());
    }
    if let Some(received) = request.amount_received {
        appointment.amount_received = round_cents(received);
    }

    if appointment.status == AppointmentStatus::Confirmed {
        let mut missing = Vec::new();
        if appointment.scheduled_date.is_none() {
            missing.push("Date is required for a confirmed appointment".to_string());
        }
        if appointment.scheduled_time.is_none() {
            missing.push("Time is required for a confirmed appointment".to_string());
        }
        if is_blank(appointment.address.as_deref()) {
            missing.push("Address is required for a confirmed appointment".to_string());
        }
        if !missing.is_empty() {
            return Err(AppointmentError::Validation(missing));
        }
    }

    if appointment.status == AppointmentStatus::Completed {
        appointment.amount_received = appointment.total_value;
        appointment.payment_status = PaymentStatus::Paid;
    } else {
        appointment.payment_status =
            derive_payment_status(appointment.total_value, appointment.amount_received);
    }

    appointment.updated_at = now.to_string();
    Ok(())
}

/// Date as shown to the operator and in messages
pub fn display_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "a combinar".to_string())
}
