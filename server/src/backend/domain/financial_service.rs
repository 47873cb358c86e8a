//! # Financial Aggregator
//!
//! Received and pending amounts by time window, computed from the full
//! appointment snapshot of an owner on every call.
//!
//! ## Windows
//!
//! All windows end at the reference date, inclusive, and are keyed by the
//! scheduled date:
//!
//! - **all_time**: every contributing appointment, scheduled or not
//! - **month**: first day of the reference month onwards
//! - **week**: the reference date and the six days before it
//! - **today**: the reference date only
//!
//! Only confirmed and completed appointments contribute. Overdue is the
//! unpaid remainder of confirmed appointments scheduled before the reference
//! date.

use anyhow::Result;
use chrono::{Datelike, Duration, Local, NaiveDate};
use shared::{Appointment, AppointmentStatus, FinancialBucket, FinancialSummary};
use std::sync::Arc;
use tracing::info;

use crate::backend::domain::money::round_cents;
use crate::backend::storage::{AppointmentFilter, AppointmentStorage, Connection};

fn add_to(bucket: &mut FinancialBucket, received: f64, pending: f64) {
    bucket.received += received;
    bucket.pending += pending;
    bucket.appointment_count += 1;
}

fn round_bucket(bucket: &mut FinancialBucket) {
    bucket.received = round_cents(bucket.received);
    bucket.pending = round_cents(bucket.pending);
}

/// Aggregate a snapshot. Order independent.
pub fn summarize(appointments: &[Appointment], today: NaiveDate) -> FinancialSummary {
    let week_start = today - Duration::days(6);
    let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);

    let mut summary = FinancialSummary {
        reference_date: today,
        all_time: FinancialBucket::default(),
        month: FinancialBucket::default(),
        week: FinancialBucket::default(),
        today: FinancialBucket::default(),
        overdue_amount: 0.0,
        overdue_count: 0,
        average_ticket: 0.0,
        completed_count: 0,
        custom_price_count: 0,
    };
    let mut completed_total = 0.0;

    for appointment in appointments {
        if appointment.use_manual_price {
            summary.custom_price_count += 1;
        }

        if !matches!(
            appointment.status,
            AppointmentStatus::Confirmed | AppointmentStatus::Completed
        ) {
            continue;
        }

        let received = appointment.amount_received;
        let pending = appointment.remaining_amount();

        add_to(&mut summary.all_time, received, pending);

        if let Some(date) = appointment.scheduled_date.filter(|d| *d <= today) {
            if date >= month_start {
                add_to(&mut summary.month, received, pending);
            }
            if date >= week_start {
                add_to(&mut summary.week, received, pending);
            }
            if date == today {
                add_to(&mut summary.today, received, pending);
            }
            if appointment.status == AppointmentStatus::Confirmed && date < today && pending > 0.0 {
                summary.overdue_amount += pending;
                summary.overdue_count += 1;
            }
        }

        if appointment.status == AppointmentStatus::Completed {
            completed_total += appointment.total_value;
            summary.completed_count += 1;
        }
    }

    for bucket in [
        &mut summary.all_time,
        &mut summary.month,
        &mut summary.week,
        &mut summary.today,
    ] {
        round_bucket(bucket);
    }
    summary.overdue_amount = round_cents(summary.overdue_amount);
    if summary.completed_count > 0 {
        summary.average_ticket = round_cents(completed_total / f64::from(summary.completed_count));
    }

    summary
}

/// Loads an owner's snapshot and runs the aggregator over it
#[derive(Clone)]
pub struct FinancialService<C: Connection> {
    appointment_repository: C::AppointmentRepository,
}

impl<C: Connection> FinancialService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            appointment_repository: connection.create_appointment_repository(),
        }
    }

    /// Summary as of `today`, defaulting to the local date
    pub async fn summary(&self, owner_id: &str, today: Option<NaiveDate>) -> Result<FinancialSummary> {
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        let appointments = self
            .appointment_repository
            .list_appointments(owner_id, &AppointmentFilter::default())
            .await?;

        info!(
            "Summarizing {} appointments for owner {} as of {}",
            appointments.len(),
            owner_id,
            today
        );
        Ok(summarize(&appointments, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::DbConnection;
    use shared::PaymentStatus;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn appointment(
        id: &str,
        status: AppointmentStatus,
        date: Option<NaiveDate>,
        total: f64,
        received: f64,
    ) -> Appointment {
        Appointment {
            id: id.to_string(),
            owner_id: "owner-1".to_string(),
            client_id: "client-1".to_string(),
            area_id: "area-1".to_string(),
            scheduled_date: date,
            scheduled_time: date.map(|_| "10:00".to_string()),
            status,
            address: None,
            services: Vec::new(),
            use_manual_price: false,
            include_travel_fee: false,
            travel_fee: 0.0,
            total_value: total,
            amount_received: received,
            payment_status: PaymentStatus::Pending,
            total_duration_minutes: 60,
            notes: None,
            created_at: "2025-03-01T09:00:00+00:00".to_string(),
            updated_at: "2025-03-01T09:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_overdue_and_average_ticket() {
        let today = day(2025, 3, 15);
        let appointments = vec![
            appointment("a1", AppointmentStatus::Completed, Some(day(2025, 3, 10)), 200.0, 200.0),
            appointment("a2", AppointmentStatus::Confirmed, Some(day(2025, 3, 14)), 150.0, 50.0),
        ];

        let summary = summarize(&appointments, today);
        assert_eq!(summary.overdue_amount, 100.0);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.average_ticket, 200.0);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.all_time.received, 250.0);
        assert_eq!(summary.all_time.pending, 100.0);
    }

    #[test]
    fn test_windows_overlap_and_end_today() {
        let today = day(2025, 3, 15);
        let appointments = vec![
            appointment("today", AppointmentStatus::Confirmed, Some(today), 100.0, 30.0),
            appointment("week", AppointmentStatus::Completed, Some(day(2025, 3, 9)), 80.0, 80.0),
            appointment("month", AppointmentStatus::Completed, Some(day(2025, 3, 1)), 60.0, 60.0),
            appointment("older", AppointmentStatus::Completed, Some(day(2025, 2, 27)), 40.0, 40.0),
            appointment("future", AppointmentStatus::Confirmed, Some(day(2025, 3, 20)), 70.0, 0.0),
            appointment("unscheduled", AppointmentStatus::Confirmed, None, 50.0, 10.0),
        ];

        let summary = summarize(&appointments, today);

        assert_eq!(summary.today.received, 30.0);
        assert_eq!(summary.today.pending, 70.0);
        assert_eq!(summary.today.appointment_count, 1);

        assert_eq!(summary.week.received, 110.0);
        assert_eq!(summary.week.appointment_count, 2);

        assert_eq!(summary.month.received, 170.0);
        assert_eq!(summary.month.appointment_count, 3);

        assert_eq!(summary.all_time.received, 220.0);
        assert_eq!(summary.all_time.pending, 180.0);
        assert_eq!(summary.all_time.appointment_count, 6);

        // neither the future nor today's appointment is overdue
        assert_eq!(summary.overdue_amount, 0.0);
    }

    #[test]
    fn test_pending_and_cancelled_are_ignored() {
        let today = day(2025, 3, 15);
        let mut manual = appointment("m", AppointmentStatus::Cancelled, Some(today), 300.0, 0.0);
        manual.use_manual_price = true;
        let appointments = vec![
            appointment("p", AppointmentStatus::Pending, None, 100.0, 0.0),
            manual,
        ];

        let summary = summarize(&appointments, today);
        assert_eq!(summary.all_time, FinancialBucket::default());
        assert_eq!(summary.average_ticket, 0.0);
        assert_eq!(summary.custom_price_count, 1);
    }

    #[test]
    fn test_order_independent() {
        let today = day(2025, 3, 15);
        let mut appointments = vec![
            appointment("a", AppointmentStatus::Completed, Some(day(2025, 3, 10)), 200.0, 200.0),
            appointment("b", AppointmentStatus::Confirmed, Some(day(2025, 3, 14)), 150.0, 50.0),
            appointment("c", AppointmentStatus::Confirmed, Some(today), 99.9, 0.1),
        ];
        let forward = summarize(&appointments, today);
        appointments.reverse();
        assert_eq!(forward, summarize(&appointments, today));
    }

    #[tokio::test]
    async fn test_service_reads_owner_snapshot() {
        let db = Arc::new(DbConnection::init_test().await.unwrap());
        let repo = db.create_appointment_repository();
        repo.store_appointment(&appointment(
            "a1",
            AppointmentStatus::Completed,
            Some(day(2025, 3, 10)),
            200.0,
            200.0,
        ))
        .await
        .unwrap();

        let service = FinancialService::new(db);
        let summary = service.summary("owner-1", Some(day(2025, 3, 15))).await.unwrap();
        assert_eq!(summary.average_ticket, 200.0);

        let other = service.summary("owner-2", Some(day(2025, 3, 15))).await.unwrap();
        assert_eq!(other.completed_count, 0);
    }
}
