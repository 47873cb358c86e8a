//! # Messaging Service
//!
//! Outbound WhatsApp messages to clients. Delivery goes through the local
//! automation process when one is configured and ready; otherwise, or when
//! it fails, the caller gets a `wa.me` deep link to open by hand.
//!
//! ## Phone numbers
//!
//! Only digits are kept. National numbers (10 or 11 digits, area code
//! included) get the configured country code prefixed.

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    Appointment, Client, DeliveryMethod, SendWhatsAppResponse, WhatsAppStatus,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::domain::appointment_builder::display_date;
use crate::backend::domain::appointment_service::AppointmentService;
use crate::backend::domain::client_service::ClientService;
use crate::backend::domain::document_service::DocumentService;
use crate::backend::domain::money::format_brl;
use crate::backend::domain::profile_service::ProfileService;
use crate::backend::storage::Connection;

const DEEP_LINK_BASE: &str = "https://wa.me";

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WhatsApp automation is not configured")]
    NotConfigured,
    #[error("WhatsApp automation not ready after {0:?}")]
    NotReady(Duration),
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Invalid phone number: {0:?}")]
    InvalidPhone(String),
    #[error("Message is empty")]
    EmptyMessage,
}

/// The local WhatsApp automation process
#[async_trait]
pub trait WhatsAppGateway: Send + Sync {
    async fn status(&self) -> Result<WhatsAppStatus, MessagingError>;

    /// Poll the status until ready or until the configured timeout; an
    /// unreachable process fails at once
    async fn wait_until_ready(&self) -> Result<(), MessagingError>;

    async fn send(&self, number: &str, message: &str) -> Result<(), MessagingError>;
}

/// Digits only, with the country code added to national numbers
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Result<String, MessagingError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 | 11 => Ok(format!("{}{}", default_country_code, digits)),
        12..=15 => Ok(digits),
        _ => Err(MessagingError::InvalidPhone(raw.to_string())),
    }
}

/// `https://wa.me/<number>?text=<encoded message>`
pub fn deep_link(number: &str, message: &str) -> String {
    format!("{}/{}?text={}", DEEP_LINK_BASE, number, urlencoding::encode(message))
}

fn with_signature(mut message: String, signature: Option<&str>) -> String {
    if let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) {
        message.push_str("\n\n");
        message.push_str(signature);
    }
    message
}

/// Confirmation sent to the client once an appointment is booked
pub fn appointment_confirmation_message(
    client: &Client,
    appointment: &Appointment,
    signature: Option<&str>,
) -> String {
    let mut lines = vec![format!("Olá, {}! Seu agendamento está confirmado.", client.name), String::new()];

    if appointment.use_manual_price || appointment.services.is_empty() {
        lines.push("Serviços: valor diferenciado".to_string());
    } else {
        lines.push("Serviços:".to_string());
        for service in &appointment.services {
            lines.push(format!("- {}x {}", service.quantity, service.service_name));
        }
    }

    lines.push(format!("Data: {}", display_date(appointment.scheduled_date)));
    lines.push(format!(
        "Horário: {}",
        appointment.scheduled_time.as_deref().unwrap_or("a combinar")
    ));
    if let Some(address) = &appointment.address {
        lines.push(format!("Endereço: {}", address));
    }
    lines.push(format!("Total: {}", format_brl(appointment.total_value)));
    if appointment.amount_received > 0.0 {
        lines.push(format!("Valor recebido: {}", format_brl(appointment.amount_received)));
    }
    lines.push(format!("Restante: {}", format_brl(appointment.remaining_amount())));

    with_signature(lines.join("\n"), signature)
}

/// Message sharing a stored document link
pub fn shared_document_message(document_name: &str, public_url: &str, signature: Option<&str>) -> String {
    with_signature(
        format!("Olá! Segue o documento {}:\n{}", document_name, public_url),
        signature,
    )
}

#[derive(Clone)]
pub struct MessagingService<C: Connection> {
    gateway: Option<Arc<dyn WhatsAppGateway>>,
    default_country_code: String,
    appointment_service: AppointmentService<C>,
    client_service: ClientService<C>,
    profile_service: ProfileService<C>,
    document_service: DocumentService,
}

impl<C: Connection> MessagingService<C> {
    pub fn new(
        gateway: Option<Arc<dyn WhatsAppGateway>>,
        default_country_code: &str,
        appointment_service: AppointmentService<C>,
        client_service: ClientService<C>,
        profile_service: ProfileService<C>,
        document_service: DocumentService,
    ) -> Self {
        Self {
            gateway,
            default_country_code: default_country_code.to_string(),
            appointment_service,
            client_service,
            profile_service,
            document_service,
        }
    }

    /// Status of the automation process; not ready when none is configured
    pub async fn status(&self) -> WhatsAppStatus {
        match &self.gateway {
            None => WhatsAppStatus { ready: false, status: Some("not_configured".to_string()) },
            Some(gateway) => match gateway.status().await {
                Ok(status) => status,
                Err(e) => {
                    warn!("WhatsApp automation status check failed: {}", e);
                    WhatsAppStatus { ready: false, status: Some("unreachable".to_string()) }
                }
            },
        }
    }

    /// Deliver through the automation process, falling back to a deep link
    pub async fn send_message(&self, phone: &str, message: &str) -> Result<SendWhatsAppResponse> {
        if message.trim().is_empty() {
            return Err(MessagingError::EmptyMessage.into());
        }
        let number = normalize_phone(phone, &self.default_country_code)?;
        let link = deep_link(&number, message);

        let delivered = match &self.gateway {
            None => Err(MessagingError::NotConfigured),
            Some(gateway) => match gateway.wait_until_ready().await {
                Ok(()) => gateway.send(&number, message).await,
                Err(e) => Err(e),
            },
        };

        match delivered {
            Ok(()) => {
                info!("💬 WhatsApp message sent to {}", number);
                Ok(SendWhatsAppResponse {
                    method: DeliveryMethod::Automation,
                    deep_link: link,
                    success_message: "Message sent".to_string(),
                })
            }
            Err(e) => {
                if !matches!(e, MessagingError::NotConfigured) {
                    warn!("Automation delivery to {} failed, falling back to deep link: {}", number, e);
                }
                Ok(SendWhatsAppResponse {
                    method: DeliveryMethod::DeepLink,
                    deep_link: link,
                    success_message: "Open the link to send the message".to_string(),
                })
            }
        }
    }

    async fn signature(&self, owner_id: &str) -> Result<Option<String>> {
        Ok(self
            .profile_service
            .find_profile(owner_id)
            .await?
            .and_then(|p| p.message_signature))
    }

    /// Send the booking confirmation of an appointment to its client
    pub async fn send_appointment_confirmation(
        &self,
        owner_id: &str,
        appointment_id: &str,
    ) -> Result<SendWhatsAppResponse> {
        let appointment = self.appointment_service.get_appointment(owner_id, appointment_id).await?;
        let client = self.client_service.get_client(owner_id, &appointment.client_id).await?;
        let signature = self.signature(owner_id).await?;

        let message = appointment_confirmation_message(&client, &appointment, signature.as_deref());
        self.send_message(&client.phone, &message).await
    }

    /// Send the public link of a stored document to a phone number
    pub async fn share_document(&self, owner_id: &str, name: &str, phone: &str) -> Result<SendWhatsAppResponse> {
        let document = self.document_service.document_url(owner_id, name).await?;
        let signature = self.signature(owner_id).await?;

        let message = shared_document_message(&document.name, &document.public_url, signature.as_deref());
        self.send_message(phone, &message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::catalog_service::CatalogService;
    use crate::backend::storage::{DbConnection, LocalDocumentStore};
    use chrono::NaiveDate;
    use shared::{AppointmentServiceLine, AppointmentStatus, PaymentStatus};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Gateway double recording sent messages
    struct RecordingGateway {
        ready: bool,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl WhatsAppGateway for RecordingGateway {
        async fn status(&self) -> Result<WhatsAppStatus, MessagingError> {
            Ok(WhatsAppStatus { ready: self.ready, status: None })
        }

        async fn wait_until_ready(&self) -> Result<(), MessagingError> {
            if self.ready {
                Ok(())
            } else {
                Err(MessagingError::NotReady(Duration::from_secs(60)))
            }
        }

        async fn send(&self, number: &str, message: &str) -> Result<(), MessagingError> {
            self.sent
                .lock()
                .unwrap()
                .push((number.to_string(), message.to_string()));
            Ok(())
        }
    }

    async fn service(
        gateway: Option<Arc<dyn WhatsAppGateway>>,
        dir: &TempDir,
    ) -> MessagingService<DbConnection> {
        let db = Arc::new(DbConnection::init_test().await.unwrap());
        let clients = ClientService::new(db.clone());
        let appointments =
            AppointmentService::new(db.clone(), clients.clone(), CatalogService::new(db.clone()));
        let documents = DocumentService::new(
            Arc::new(LocalDocumentStore::new(dir.path(), "http://localhost:3000")),
            1024,
        );
        MessagingService::new(gateway, "55", appointments, clients, ProfileService::new(db), documents)
    }

    fn client() -> Client {
        Client {
            id: "client-1".to_string(),
            owner_id: "owner-1".to_string(),
            name: "Ana".to_string(),
            phone: "(11) 98888-7777".to_string(),
            email: None,
            address: None,
            instagram: None,
            notes: None,
            created_at: "2025-03-01T09:00:00+00:00".to_string(),
            updated_at: "2025-03-01T09:00:00+00:00".to_string(),
        }
    }

    fn appointment() -> Appointment {
        Appointment {
            id: "a1".to_string(),
            owner_id: "owner-1".to_string(),
            client_id: "client-1".to_string(),
            area_id: "area-1".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            scheduled_time: Some("14:30".to_string()),
            status: AppointmentStatus::Confirmed,
            address: Some("Rua A, 1".to_string()),
            services: vec![AppointmentServiceLine {
                id: "l1".to_string(),
                appointment_id: "a1".to_string(),
                service_id: "s1".to_string(),
                service_name: "Escova".to_string(),
                quantity: 2,
                unit_price: 50.0,
                total_price: 100.0,
            }],
            use_manual_price: false,
            include_travel_fee: true,
            travel_fee: 15.0,
            total_value: 115.0,
            amount_received: 50.0,
            payment_status: PaymentStatus::Partial,
            total_duration_minutes: 60,
            notes: None,
            created_at: "2025-03-01T09:00:00+00:00".to_string(),
            updated_at: "2025-03-01T09:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("(11) 98888-7777", "55").unwrap(), "5511988887777");
        assert_eq!(normalize_phone("11 3333-4444", "55").unwrap(), "551133334444");
        assert_eq!(normalize_phone("+55 11 98888-7777", "55").unwrap(), "5511988887777");
        assert!(normalize_phone("98888-7777", "55").is_err());
        assert!(normalize_phone("", "55").is_err());
    }

    #[test]
    fn test_deep_link_encodes_message() {
        assert_eq!(
            deep_link("5511988887777", "Olá, Ana! Total: R$ 115,00"),
            "https://wa.me/5511988887777?text=Ol%C3%A1%2C%20Ana%21%20Total%3A%20R%24%20115%2C00"
        );
    }

    #[test]
    fn test_confirmation_message() {
        let message = appointment_confirmation_message(&client(), &appointment(), Some("Beijos, Bela"));
        assert_eq!(
            message,
            "Olá, Ana! Seu agendamento está confirmado.\n\n\
             Serviços:\n\
             - 2x Escova\n\
             Data: 10/03/2025\n\
             Horário: 14:30\n\
             Endereço: Rua A, 1\n\
             Total: R$ 115,00\n\
             Valor recebido: R$ 50,00\n\
             Restante: R$ 65,00\n\n\
             Beijos, Bela"
        );
    }

    #[test]
    fn test_manual_price_message_hides_lines() {
        let mut manual = appointment();
        manual.use_manual_price = true;
        manual.services.clear();
        let message = appointment_confirmation_message(&client(), &manual, None);
        assert!(message.contains("Serviços: valor diferenciado"));
        assert!(!message.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_send_through_ready_gateway() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(RecordingGateway { ready: true, sent: Mutex::new(Vec::new()) });
        let messaging = service(Some(gateway.clone()), &dir).await;

        let response = messaging.send_message("(11) 98888-7777", "Oi").await.unwrap();
        assert_eq!(response.method, DeliveryMethod::Automation);
        assert_eq!(
            gateway.sent.lock().unwrap().as_slice(),
            &[("5511988887777".to_string(), "Oi".to_string())]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_deep_link() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(RecordingGateway { ready: false, sent: Mutex::new(Vec::new()) });
        let messaging = service(Some(gateway.clone()), &dir).await;

        let response = messaging.send_message("11988887777", "Oi").await.unwrap();
        assert_eq!(response.method, DeliveryMethod::DeepLink);
        assert_eq!(response.deep_link, "https://wa.me/5511988887777?text=Oi");
        assert!(gateway.sent.lock().unwrap().is_empty());

        let unconfigured = service(None, &dir).await;
        let response = unconfigured.send_message("11988887777", "Oi").await.unwrap();
        assert_eq!(response.method, DeliveryMethod::DeepLink);
        assert!(!unconfigured.status().await.ready);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let dir = TempDir::new().unwrap();
        let messaging = service(None, &dir).await;

        let err = messaging.send_message("123", "Oi").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MessagingError>(),
            Some(MessagingError::InvalidPhone(_))
        ));
        let err = messaging.send_message("11988887777", "  ").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<MessagingError>(), Some(MessagingError::EmptyMessage)));
    }
}
