//! # Appointment Service
//!
//! Orchestrates the booking flow: validation, pricing, the duplicate guard,
//! the down-payment confirmation gate and the multi-step write
//! (client, appointment row, service lines).
//!
//! ## Creation steps
//!
//! 1. Validate the form; nothing is read or written when it fails
//! 2. Price the selection against the owner's catalog
//! 3. Resolve the client (existing) or keep the new-client form for later
//! 4. Reject exact duplicates of an existing booking
//! 5. Ask for down-payment confirmation when required, without writing
//! 6. Write client, appointment and lines; on failure undo earlier writes
//!
//! Compensation is best effort: a failing undo is logged and the original
//! error is returned.

use anyhow::Result;
use chrono::Utc;
use shared::{
    Appointment, AppointmentListResponse, AppointmentResponse, ClientSelection,
    CreateAppointmentRequest, CreateAppointmentResponse, UpdateAppointmentRequest,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backend::domain::appointment_builder::{
    apply_update, build_appointment, down_payment_amount, is_duplicate,
    pending_payment_confirmation, validate_create_request, AppointmentError,
};
use crate::backend::domain::catalog_service::CatalogService;
use crate::backend::domain::client_service::{ClientError, ClientService};
use crate::backend::domain::money::format_brl;
use crate::backend::domain::pricing::calculate_quote;
use crate::backend::storage::{AppointmentFilter, AppointmentStorage, Connection};

#[derive(Clone)]
pub struct AppointmentService<C: Connection> {
    appointment_repository: C::AppointmentRepository,
    client_service: ClientService<C>,
    catalog_service: CatalogService<C>,
}

impl<C: Connection> AppointmentService<C> {
    pub fn new(
        connection: Arc<C>,
        client_service: ClientService<C>,
        catalog_service: CatalogService<C>,
    ) -> Self {
        Self {
            appointment_repository: connection.create_appointment_repository(),
            client_service,
            catalog_service,
        }
    }

    pub async fn create_appointment(
        &self,
        owner_id: &str,
        request: CreateAppointmentRequest,
    ) -> Result<CreateAppointmentResponse> {
        info!(
            "Creating appointment for owner {} (confirmed: {}, manual price: {})",
            owner_id, request.is_confirmed, request.quote.use_manual_price
        );

        validate_create_request(&request)?;
        let down_payment = down_payment_amount(&request)
            .map_err(|message| AppointmentError::Validation(vec![message]))?;

        let catalog = self.catalog_service.pricing_catalog(owner_id).await?;
        let quote = calculate_quote(&catalog, &request.quote)
            .map_err(|e| AppointmentError::Validation(vec![e.to_string()]))?;

        let existing_client_id = match &request.client {
            ClientSelection::Existing { client_id } => {
                let client = self
                    .client_service
                    .get_client(owner_id, client_id)
                    .await
                    .map_err(|e| -> anyhow::Error {
                        if matches!(e.downcast_ref::<ClientError>(), Some(ClientError::NotFound(_))) {
                            AppointmentError::ClientNotFound(client_id.clone()).into()
                        } else {
                            e
                        }
                    })?;
                Some(client.id)
            }
            ClientSelection::New(_) => None,
        };

        // a client created in this flow cannot have earlier bookings
        if let Some(client_id) = &existing_client_id {
            let candidate = build_appointment(owner_id, client_id, &request, &quote, down_payment, "");
            if !candidate.use_manual_price {
                let schedule = match (request.is_confirmed, candidate.scheduled_date, &candidate.scheduled_time) {
                    (true, Some(date), Some(time)) => Some((date, time.as_str())),
                    _ => None,
                };
                let existing = self
                    .appointment_repository
                    .find_appointments_for_client_area(owner_id, client_id, &candidate.area_id, schedule)
                    .await?;
                if is_duplicate(&existing, &candidate) {
                    warn!("Duplicate appointment blocked for client {} in area {}", client_id, candidate.area_id);
                    return Err(AppointmentError::Duplicate.into());
                }
            }
        }

        if let Some(amount) = pending_payment_confirmation(&request, down_payment) {
            info!("Down payment of {:.2} awaiting operator confirmation", amount);
            return Ok(CreateAppointmentResponse::PaymentConfirmationRequired {
                amount,
                total: quote.total,
                message: format!(
                    "Confirm that the down payment of {} was received (total {})",
                    format_brl(amount),
                    format_brl(quote.total)
                ),
            });
        }

        let (client_id, created_client_id) = match (&request.client, existing_client_id) {
            (_, Some(client_id)) => (client_id, None),
            (ClientSelection::New(new_client), None) => {
                let created = self.client_service.create_client(owner_id, new_client.clone()).await?;
                let id = created.client.id;
                (id.clone(), Some(id))
            }
            (ClientSelection::Existing { client_id }, None) => {
                return Err(AppointmentError::ClientNotFound(client_id.clone()).into());
            }
        };

        let now = Utc::now().to_rfc3339();
        let appointment = build_appointment(owner_id, &client_id, &request, &quote, down_payment, &now);

        if let Err(e) = self.appointment_repository.store_appointment(&appointment).await {
            error!("Failed to store appointment {}: {}", appointment.id, e);
            self.compensate(owner_id, None, created_client_id.as_deref()).await;
            return Err(e);
        }

        if !appointment.services.is_empty() {
            if let Err(e) = self
                .appointment_repository
                .store_service_lines(owner_id, &appointment.services)
                .await
            {
                error!("Failed to store service lines of appointment {}: {}", appointment.id, e);
                self.compensate(owner_id, Some(&appointment.id), created_client_id.as_deref())
                    .await;
                return Err(e);
            }
        }

        info!(
            "✅ Created appointment {} for client {} (total {:.2}, {})",
            appointment.id, client_id, appointment.total_value, appointment.payment_status
        );

        Ok(CreateAppointmentResponse::Created {
            success_message: format!("Appointment saved, total {}", format_brl(appointment.total_value)),
            appointment,
        })
    }

    /// Undo the writes of a failed creation
    async fn compensate(&self, owner_id: &str, appointment_id: Option<&str>, client_id: Option<&str>) {
        if let Some(appointment_id) = appointment_id {
            match self.appointment_repository.delete_appointment(owner_id, appointment_id).await {
                Ok(_) => info!("Rolled back appointment {}", appointment_id),
                Err(e) => error!("Failed to roll back appointment {}: {}", appointment_id, e),
            }
        }
        if let Some(client_id) = client_id {
            match self.client_service.delete_client(owner_id, client_id).await {
                Ok(()) => info!("Rolled back client {}", client_id),
                Err(e) => error!("Failed to roll back client {}: {}", client_id, e),
            }
        }
    }

    pub async fn get_appointment(&self, owner_id: &str, appointment_id: &str) -> Result<Appointment> {
        self.appointment_repository
            .get_appointment(owner_id, appointment_id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound(appointment_id.to_string()).into())
    }

    pub async fn list_appointments(
        &self,
        owner_id: &str,
        filter: &AppointmentFilter,
    ) -> Result<AppointmentListResponse> {
        let appointments = self.appointment_repository.list_appointments(owner_id, filter).await?;
        info!("Found {} appointments for owner {}", appointments.len(), owner_id);
        Ok(AppointmentListResponse { appointments })
    }

    pub async fn update_appointment(
        &self,
        owner_id: &str,
        appointment_id: &str,
        request: UpdateAppointmentRequest,
    ) -> Result<AppointmentResponse> {
        let mut appointment = self.get_appointment(owner_id, appointment_id).await?;
        let previous_status = appointment.status;

        apply_update(&mut appointment, &request, &Utc::now().to_rfc3339())?;

        if !self.appointment_repository.update_appointment(&appointment).await? {
            return Err(AppointmentError::NotFound(appointment_id.to_string()).into());
        }

        info!(
            "Updated appointment {} ({} -> {}, {})",
            appointment.id, previous_status, appointment.status, appointment.payment_status
        );

        Ok(AppointmentResponse {
            success_message: format!("Appointment {}", appointment.status),
            appointment,
        })
    }
}
