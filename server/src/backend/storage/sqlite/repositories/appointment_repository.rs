use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};
use std::collections::HashMap;
use shared::{Appointment, AppointmentServiceLine, AppointmentStatus, PaymentStatus};

use crate::backend::storage::sqlite::connection::DbConnection;
use crate::backend::storage::traits::{AppointmentFilter, AppointmentStorage};

const DATE_FORMAT: &str = "%Y-%m-%d";

const APPOINTMENT_COLUMNS: &str = "id, owner_id, client_id, area_id, scheduled_date, scheduled_time, \
     status, address, use_manual_price, include_travel_fee, travel_fee, total_value, \
     amount_received, payment_status, total_duration_minutes, notes, created_at, updated_at";

/// Repository for appointments and their service lines
#[derive(Clone)]
pub struct AppointmentRepository {
    db: DbConnection,
}

impl AppointmentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Map an appointment row; lines are attached separately
    fn map_row(row: &SqliteRow) -> Result<Appointment> {
        let status: String = row.get("status");
        let payment_status: String = row.get("payment_status");
        let scheduled_date: Option<String> = row.get("scheduled_date");

        let scheduled_date = scheduled_date
            .map(|raw| NaiveDate::parse_from_str(&raw, DATE_FORMAT))
            .transpose()
            .context("Invalid scheduled_date stored in appointments")?;

        Ok(Appointment {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            client_id: row.get("client_id"),
            area_id: row.get("area_id"),
            scheduled_date,
            scheduled_time: row.get("scheduled_time"),
            status: status.parse::<AppointmentStatus>().map_err(|e| anyhow!(e))?,
            address: row.get("address"),
            services: Vec::new(),
            use_manual_price: row.get("use_manual_price"),
            include_travel_fee: row.get("include_travel_fee"),
            travel_fee: row.get("travel_fee"),
            total_value: row.get("total_value"),
            amount_received: row.get("amount_received"),
            payment_status: payment_status.parse::<PaymentStatus>().map_err(|e| anyhow!(e))?,
            total_duration_minutes: row.get::<i64, _>("total_duration_minutes").max(0) as u32,
            notes: row.get("notes"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn map_line(row: &SqliteRow) -> AppointmentServiceLine {
        AppointmentServiceLine {
            id: row.get("id"),
            appointment_id: row.get("appointment_id"),
            service_id: row.get("service_id"),
            service_name: row.get("service_name"),
            quantity: row.get::<i64, _>("quantity").max(0) as u32,
            unit_price: row.get("unit_price"),
            total_price: row.get("total_price"),
        }
    }

    /// Load the lines of the given appointments and attach them in order
    async fn attach_lines(&self, owner_id: &str, appointments: &mut [Appointment]) -> Result<()> {
        if appointments.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, appointment_id, service_id, service_name, quantity, unit_price, total_price \
             FROM appointment_services WHERE owner_id = ",
        );
        builder.push_bind(owner_id);
        builder.push(" AND appointment_id IN (");
        let mut separated = builder.separated(", ");
        for appointment in appointments.iter() {
            separated.push_bind(appointment.id.clone());
        }
        separated.push_unseparated(") ORDER BY appointment_id, position ASC");

        let rows = builder.build().fetch_all(self.db.pool()).await?;

        let mut by_appointment: HashMap<String, Vec<AppointmentServiceLine>> = HashMap::new();
        for row in rows.iter() {
            let line = Self::map_line(row);
            by_appointment.entry(line.appointment_id.clone()).or_default().push(line);
        }

        for appointment in appointments.iter_mut() {
            appointment.services = by_appointment.remove(&appointment.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn fetch_many(&self, owner_id: &str, mut builder: QueryBuilder<'_, Sqlite>) -> Result<Vec<Appointment>> {
        let rows = builder.build().fetch_all(self.db.pool()).await?;
        let mut appointments = rows.iter().map(Self::map_row).collect::<Result<Vec<_>>>()?;
        self.attach_lines(owner_id, &mut appointments).await?;
        Ok(appointments)
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

#[async_trait]
impl AppointmentStorage for AppointmentRepository {
    async fn store_appointment(&self, appointment: &Appointment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, owner_id, client_id, area_id, scheduled_date, scheduled_time, status, address,
                use_manual_price, include_travel_fee, travel_fee, total_value, amount_received,
                payment_status, total_duration_minutes, notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.owner_id)
        .bind(&appointment.client_id)
        .bind(&appointment.area_id)
        .bind(format_date(appointment.scheduled_date))
        .bind(&appointment.scheduled_time)
        .bind(appointment.status.as_str())
        .bind(&appointment.address)
        .bind(appointment.use_manual_price)
        .bind(appointment.include_travel_fee)
        .bind(appointment.travel_fee)
        .bind(appointment.total_value)
        .bind(appointment.amount_received)
        .bind(appointment.payment_status.as_str())
        .bind(i64::from(appointment.total_duration_minutes))
        .bind(&appointment.notes)
        .bind(&appointment.created_at)
        .bind(&appointment.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn store_service_lines(
        &self,
        owner_id: &str,
        lines: &[AppointmentServiceLine],
    ) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO appointment_services (
                    id, owner_id, appointment_id, service_id, service_name, quantity, unit_price, total_price, position
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&line.id)
            .bind(owner_id)
            .bind(&line.appointment_id)
            .bind(&line.service_id)
            .bind(&line.service_name)
            .bind(i64::from(line.quantity))
            .bind(line.unit_price)
            .bind(line.total_price)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_appointment(
        &self,
        owner_id: &str,
        appointment_id: &str,
    ) -> Result<Option<Appointment>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM appointments WHERE owner_id = ", APPOINTMENT_COLUMNS));
        builder.push_bind(owner_id);
        builder.push(" AND id = ");
        builder.push_bind(appointment_id);

        Ok(self.fetch_many(owner_id, builder).await?.into_iter().next())
    }

    async fn list_appointments(
        &self,
        owner_id: &str,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM appointments WHERE owner_id = ", APPOINTMENT_COLUMNS));
        builder.push_bind(owner_id);

        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(from) = filter.from {
            builder.push(" AND scheduled_date >= ");
            builder.push_bind(from.format(DATE_FORMAT).to_string());
        }
        if let Some(to) = filter.to {
            builder.push(" AND scheduled_date <= ");
            builder.push_bind(to.format(DATE_FORMAT).to_string());
        }
        builder.push(
            " ORDER BY scheduled_date IS NULL, scheduled_date ASC, scheduled_time ASC, created_at ASC",
        );

        self.fetch_many(owner_id, builder).await
    }

    async fn find_appointments_for_client_area(
        &self,
        owner_id: &str,
        client_id: &str,
        area_id: &str,
        schedule: Option<(NaiveDate, &str)>,
    ) -> Result<Vec<Appointment>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM appointments WHERE owner_id = ", APPOINTMENT_COLUMNS));
        builder.push_bind(owner_id);
        builder.push(" AND client_id = ");
        builder.push_bind(client_id);
        builder.push(" AND area_id = ");
        builder.push_bind(area_id);

        if let Some((date, time)) = schedule {
            builder.push(" AND scheduled_date = ");
            builder.push_bind(date.format(DATE_FORMAT).to_string());
            builder.push(" AND scheduled_time = ");
            builder.push_bind(time.to_string());
        }
        builder.push(" ORDER BY created_at ASC");

        self.fetch_many(owner_id, builder).await
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET scheduled_date = ?, scheduled_time = ?, status = ?, address = ?,
                amount_received = ?, payment_status = ?, notes = ?, updated_at = ?
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(format_date(appointment.scheduled_date))
        .bind(&appointment.scheduled_time)
        .bind(appointment.status.as_str())
        .bind(&appointment.address)
        .bind(appointment.amount_received)
        .bind(appointment.payment_status.as_str())
        .bind(&appointment.notes)
        .bind(&appointment.updated_at)
        .bind(&appointment.owner_id)
        .bind(&appointment.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_appointment(&self, owner_id: &str, appointment_id: &str) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM appointment_services WHERE owner_id = ? AND appointment_id = ?")
            .bind(owner_id)
            .bind(appointment_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM appointments WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(appointment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(id: &str, date: Option<&str>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: id.to_string(),
            owner_id: "owner-1".to_string(),
            client_id: "client-1".to_string(),
            area_id: "area-1".to_string(),
            scheduled_date: date.map(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).unwrap()),
            scheduled_time: date.map(|_| "14:30".to_string()),
            status,
            address: Some("Rua A, 1".to_string()),
            services: Vec::new(),
            use_manual_price: false,
            include_travel_fee: true,
            travel_fee: 15.0,
            total_value: 115.0,
            amount_received: 0.0,
            payment_status: PaymentStatus::Pending,
            total_duration_minutes: 30,
            notes: None,
            created_at: format!("2025-03-01T09:00:0{}+00:00", id.len() % 10),
            updated_at: "2025-03-01T09:00:00+00:00".to_string(),
        }
    }

    fn line(id: &str, appointment_id: &str, service_id: &str, quantity: u32) -> AppointmentServiceLine {
        AppointmentServiceLine {
            id: id.to_string(),
            appointment_id: appointment_id.to_string(),
            service_id: service_id.to_string(),
            service_name: format!("Service {}", service_id),
            quantity,
            unit_price: 50.0,
            total_price: 50.0 * quantity as f64,
        }
    }

    #[tokio::test]
    async fn test_round_trip_with_lines_in_order() {
        let repo = AppointmentRepository::new(DbConnection::init_test().await.unwrap());
        let stored = appointment("a1", Some("2025-03-10"), AppointmentStatus::Confirmed);
        repo.store_appointment(&stored).await.unwrap();
        repo.store_service_lines(
            "owner-1",
            &[line("l2", "a1", "s2", 1), line("l1", "a1", "s1", 2)],
        )
        .await
        .unwrap();

        let loaded = repo.get_appointment("owner-1", "a1").await.unwrap().unwrap();
        assert_eq!(loaded.status, AppointmentStatus::Confirmed);
        assert_eq!(loaded.scheduled_date, stored.scheduled_date);
        assert!(loaded.include_travel_fee);
        let services: Vec<&str> = loaded.services.iter().map(|l| l.service_id.as_str()).collect();
        assert_eq!(services, vec!["s2", "s1"]);

        assert!(repo.get_appointment("owner-2", "a1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_unscheduled_last() {
        let repo = AppointmentRepository::new(DbConnection::init_test().await.unwrap());
        repo.store_appointment(&appointment("a1", None, AppointmentStatus::Pending)).await.unwrap();
        repo.store_appointment(&appointment("a22", Some("2025-03-12"), AppointmentStatus::Confirmed))
            .await
            .unwrap();
        repo.store_appointment(&appointment("a333", Some("2025-03-05"), AppointmentStatus::Completed))
            .await
            .unwrap();

        let all = repo.list_appointments("owner-1", &AppointmentFilter::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a333", "a22", "a1"]);

        let confirmed = repo
            .list_appointments(
                "owner-1",
                &AppointmentFilter { status: Some(AppointmentStatus::Confirmed), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, "a22");

        let ranged = repo
            .list_appointments(
                "owner-1",
                &AppointmentFilter {
                    status: None,
                    from: NaiveDate::from_ymd_opt(2025, 3, 1),
                    to: NaiveDate::from_ymd_opt(2025, 3, 10),
                },
            )
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].id, "a333");
    }

    #[tokio::test]
    async fn test_find_for_client_area_respects_schedule() {
        let repo = AppointmentRepository::new(DbConnection::init_test().await.unwrap());
        repo.store_appointment(&appointment("a1", Some("2025-03-12"), AppointmentStatus::Confirmed))
            .await
            .unwrap();
        repo.store_appointment(&appointment("a22", None, AppointmentStatus::Pending)).await.unwrap();

        let any = repo
            .find_appointments_for_client_area("owner-1", "client-1", "area-1", None)
            .await
            .unwrap();
        assert_eq!(any.len(), 2);

        let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let exact = repo
            .find_appointments_for_client_area("owner-1", "client-1", "area-1", Some((date, "14:30")))
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].id, "a1");

        let other_time = repo
            .find_appointments_for_client_area("owner-1", "client-1", "area-1", Some((date, "09:00")))
            .await
            .unwrap();
        assert!(other_time.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = AppointmentRepository::new(DbConnection::init_test().await.unwrap());
        let mut stored = appointment("a1", Some("2025-03-12"), AppointmentStatus::Confirmed);
        repo.store_appointment(&stored).await.unwrap();
        repo.store_service_lines("owner-1", &[line("l1", "a1", "s1", 1)]).await.unwrap();

        stored.status = AppointmentStatus::Completed;
        stored.amount_received = 115.0;
        stored.payment_status = PaymentStatus::Paid;
        assert!(repo.update_appointment(&stored).await.unwrap());

        let loaded = repo.get_appointment("owner-1", "a1").await.unwrap().unwrap();
        assert_eq!(loaded.payment_status, PaymentStatus::Paid);
        assert_eq!(loaded.amount_received, 115.0);

        assert!(repo.delete_appointment("owner-1", "a1").await.unwrap());
        assert!(repo.get_appointment("owner-1", "a1").await.unwrap().is_none());
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointment_services")
            .fetch_one(repo.db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
