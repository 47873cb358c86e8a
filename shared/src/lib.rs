use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

/// Lifecycle of an appointment. Cancellation is a status, never a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Requested but not scheduled yet
    Pending,
    /// Date, time and address agreed with the client
    Confirmed,
    /// Service delivered
    Completed,
    /// Called off by either side
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("Unknown appointment status: {}", other)),
        }
    }
}

/// How much of the service value has been collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Operator profile, one per owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub owner_id: String,
    pub business_name: String,
    /// WhatsApp number the business sends from
    pub phone: String,
    pub email: Option<String>,
    /// Appended to outgoing WhatsApp messages when present
    pub message_signature: Option<String>,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertProfileRequest {
    pub business_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub message_signature: Option<String>,
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub instagram: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub instagram: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResponse {
    pub client: Client,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientListResponse {
    pub clients: Vec<Client>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// A service offered by the business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    /// Category name, not an id
    pub category: String,
    /// Price charged when the area has no regional override
    pub standard_price: f64,
    pub duration_minutes: u32,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Create or fully replace a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub category: String,
    pub standard_price: f64,
    pub duration_minutes: u32,
    #[serde(default)]
    pub description: Option<String>,
}

/// A region the business travels to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub travel_fee: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAreaRequest {
    pub name: String,
    #[serde(default)]
    pub travel_fee: f64,
}

/// Override price for a (service, area) pair. Already includes travel cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalPrice {
    pub owner_id: String,
    pub service_id: String,
    pub area_id: String,
    pub price: f64,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRegionalPriceRequest {
    pub service_id: String,
    pub area_id: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse<T> {
    pub items: Vec<T>,
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedService {
    pub service_id: String,
    pub quantity: u32,
}

/// Everything the calculator screen knows when it asks for a price
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    #[serde(default)]
    pub services: Vec<SelectedService>,
    pub area_id: Option<String>,
    #[serde(default)]
    pub include_travel_fee: bool,
    #[serde(default)]
    pub use_manual_price: bool,
    /// Operator-typed amount, e.g. "250,00"
    #[serde(default)]
    pub manual_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub service_id: String,
    pub service_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
    /// Service duration multiplied by quantity
    pub duration_minutes: u32,
    /// True when the unit price came from a regional override
    pub regional_price: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub services_total: f64,
    pub has_any_regional_price: bool,
    /// Travel fee actually added to the total (0 when not applied)
    pub travel_fee: f64,
    pub total: f64,
    pub total_duration_minutes: u32,
    pub manual_price: bool,
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentServiceLine {
    pub id: String,
    pub appointment_id: String,
    pub service_id: String,
    pub service_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub owner_id: String,
    pub client_id: String,
    pub area_id: String,
    pub scheduled_date: Option<NaiveDate>,
    /// "HH:MM"
    pub scheduled_time: Option<String>,
    pub status: AppointmentStatus,
    pub address: Option<String>,
    /// Empty when a manual price was used
    pub services: Vec<AppointmentServiceLine>,
    pub use_manual_price: bool,
    pub include_travel_fee: bool,
    pub travel_fee: f64,
    pub total_value: f64,
    pub amount_received: f64,
    pub payment_status: PaymentStatus,
    pub total_duration_minutes: u32,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Part of the total value not collected yet, never negative
    pub fn remaining_amount(&self) -> f64 {
        (self.total_value - self.amount_received).max(0.0)
    }
}

/// Who the appointment is for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientSelection {
    Existing { client_id: String },
    New(CreateClientRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub client: ClientSelection,
    pub quote: QuoteInput,
    #[serde(default)]
    pub is_confirmed: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    /// "HH:MM"
    #[serde(default)]
    pub scheduled_time: Option<String>,
    /// Amount collected at confirmation time, e.g. "50,00"
    #[serde(default)]
    pub down_payment: Option<String>,
    /// Set once the operator confirmed the down payment actually arrived
    #[serde(default)]
    pub down_payment_confirmed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CreateAppointmentResponse {
    Created {
        appointment: Appointment,
        success_message: String,
    },
    /// Nothing was stored; resubmit with `down_payment_confirmed = true`
    PaymentConfirmationRequired {
        amount: f64,
        total: f64,
        message: String,
    },
}

/// Partial edit; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    pub address: Option<String>,
    pub amount_received: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub appointment: Appointment,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
}

// ---------------------------------------------------------------------------
// Finance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialBucket {
    pub received: f64,
    pub pending: f64,
    pub appointment_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub reference_date: NaiveDate,
    pub all_time: FinancialBucket,
    pub month: FinancialBucket,
    pub week: FinancialBucket,
    pub today: FinancialBucket,
    pub overdue_amount: f64,
    pub overdue_count: u32,
    pub average_ticket: f64,
    pub completed_count: u32,
    pub custom_price_count: u32,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub name: String,
    pub size_bytes: u64,
    /// RFC 3339 timestamp
    pub updated_at: String,
    pub public_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<StoredDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUrlResponse {
    pub name: String,
    pub public_url: String,
}

// ---------------------------------------------------------------------------
// WhatsApp
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppStatus {
    pub ready: bool,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendWhatsAppRequest {
    pub phone: String,
    pub message: String,
}

/// Recipient of a shared document link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareDocumentRequest {
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Delivered through the local automation process
    Automation,
    /// Caller has to open the returned wa.me link
    DeepLink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendWhatsAppResponse {
    pub method: DeliveryMethod,
    /// Always filled so the UI can offer the link as a fallback
    pub deep_link: String,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub details: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_forms_match_serde() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
        assert!("archived".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_client_selection_is_tagged() {
        let json = r#"{"kind":"existing","client_id":"c-1"}"#;
        let selection: ClientSelection = serde_json::from_str(json).unwrap();
        assert_eq!(selection, ClientSelection::Existing { client_id: "c-1".to_string() });

        let json = r#"{"kind":"new","name":"Ana","phone":"11 98888-7777"}"#;
        match serde_json::from_str::<ClientSelection>(json).unwrap() {
            ClientSelection::New(request) => {
                assert_eq!(request.name, "Ana");
                assert!(request.email.is_none());
            }
            other => panic!("unexpected selection: {:?}", other),
        }
    }

    #[test]
    fn test_remaining_amount_never_negative() {
        let appointment = Appointment {
            id: "a".to_string(),
            owner_id: "o".to_string(),
            client_id: "c".to_string(),
            area_id: "x".to_string(),
            scheduled_date: None,
            scheduled_time: None,
            status: AppointmentStatus::Confirmed,
            address: None,
            services: Vec::new(),
            use_manual_price: false,
            include_travel_fee: false,
            travel_fee: 0.0,
            total_value: 100.0,
            amount_received: 120.0,
            payment_status: PaymentStatus::Paid,
            total_duration_minutes: 30,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(appointment.remaining_amount(), 0.0);
    }
}
