//! CSV export of an owner's appointments for spreadsheet bookkeeping.

use anyhow::{anyhow, Context, Result};
use csv::Writer;
use serde::Serialize;
use shared::{Appointment, Client};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::backend::storage::{AppointmentFilter, AppointmentStorage, ClientStorage, Connection};

/// One exported row
#[derive(Debug, Serialize)]
struct AppointmentExportRecord<'a> {
    date: String,
    time: &'a str,
    client: &'a str,
    status: &'static str,
    total: String,
    received: String,
    remaining: String,
    payment_status: &'static str,
    manual_price: bool,
}

fn amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// Render appointments as CSV, resolving client names from `clients`
pub fn appointments_to_csv(appointments: &[Appointment], clients: &[Client]) -> Result<String> {
    let names: HashMap<&str, &str> = clients
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut writer = Writer::from_writer(Vec::new());
    for appointment in appointments {
        writer.serialize(AppointmentExportRecord {
            date: appointment
                .scheduled_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            time: appointment.scheduled_time.as_deref().unwrap_or(""),
            client: names.get(appointment.client_id.as_str()).copied().unwrap_or(""),
            status: appointment.status.as_str(),
            total: amount(appointment.total_value),
            received: amount(appointment.amount_received),
            remaining: amount(appointment.remaining_amount()),
            payment_status: appointment.payment_status.as_str(),
            manual_price: appointment.use_manual_price,
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish CSV export: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV export is not valid UTF-8")
}

#[derive(Clone)]
pub struct ExportService<C: Connection> {
    appointment_repository: C::AppointmentRepository,
    client_repository: C::ClientRepository,
}

impl<C: Connection> ExportService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            appointment_repository: connection.create_appointment_repository(),
            client_repository: connection.create_client_repository(),
        }
    }

    pub async fn export_appointments_csv(&self, owner_id: &str) -> Result<String> {
        let appointments = self
            .appointment_repository
            .list_appointments(owner_id, &AppointmentFilter::default())
            .await?;
        let clients = self.client_repository.list_clients(owner_id).await?;

        info!("Exporting {} appointments for owner {}", appointments.len(), owner_id);
        appointments_to_csv(&appointments, &clients)
    }
}
