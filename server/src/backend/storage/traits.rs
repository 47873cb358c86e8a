//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.
//!
//! Every method takes the owning operator id. Implementations must scope
//! every read and write by it; one operator never sees another's rows.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    Appointment, AppointmentServiceLine, AppointmentStatus, Client, Profile, RegionalPrice,
    Service, ServiceArea, ServiceCategory,
};

/// Filter for listing appointments. Empty filter returns everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    /// Inclusive lower bound on the scheduled date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the scheduled date
    pub to: Option<NaiveDate>,
}

/// Operator profile storage (`profiles` collection)
#[async_trait]
pub trait ProfileStorage: Send + Sync {
    async fn get_profile(&self, owner_id: &str) -> Result<Option<Profile>>;

    /// Insert or replace the single profile row of an owner
    async fn upsert_profile(&self, profile: &Profile) -> Result<()>;
}

/// Client roster storage (`clients` collection)
#[async_trait]
pub trait ClientStorage: Send + Sync {
    async fn store_client(&self, client: &Client) -> Result<()>;

    async fn get_client(&self, owner_id: &str, client_id: &str) -> Result<Option<Client>>;

    /// List all clients of an owner ordered by name
    async fn list_clients(&self, owner_id: &str) -> Result<Vec<Client>>;

    /// Returns false when no row matched
    async fn update_client(&self, client: &Client) -> Result<bool>;

    /// Returns false when no row matched
    async fn delete_client(&self, owner_id: &str, client_id: &str) -> Result<bool>;
}

/// Service catalog storage (`service_categories`, `services`, `service_areas`
/// and `service_regional_prices` collections)
#[async_trait]
pub trait CatalogStorage: Send + Sync {
    async fn store_category(&self, category: &ServiceCategory) -> Result<()>;
    async fn list_categories(&self, owner_id: &str) -> Result<Vec<ServiceCategory>>;
    async fn delete_category(&self, owner_id: &str, category_id: &str) -> Result<bool>;

    async fn store_service(&self, service: &Service) -> Result<()>;
    async fn get_service(&self, owner_id: &str, service_id: &str) -> Result<Option<Service>>;
    async fn list_services(&self, owner_id: &str) -> Result<Vec<Service>>;
    async fn update_service(&self, service: &Service) -> Result<bool>;
    /// Also removes the regional overrides of the service
    async fn delete_service(&self, owner_id: &str, service_id: &str) -> Result<bool>;

    async fn store_area(&self, area: &ServiceArea) -> Result<()>;
    async fn get_area(&self, owner_id: &str, area_id: &str) -> Result<Option<ServiceArea>>;
    async fn list_areas(&self, owner_id: &str) -> Result<Vec<ServiceArea>>;
    async fn update_area(&self, area: &ServiceArea) -> Result<bool>;
    /// Also removes the regional overrides of the area
    async fn delete_area(&self, owner_id: &str, area_id: &str) -> Result<bool>;

    /// Insert or replace the override of a (service, area) pair
    async fn upsert_regional_price(&self, price: &RegionalPrice) -> Result<()>;
    async fn list_regional_prices(&self, owner_id: &str) -> Result<Vec<RegionalPrice>>;
    async fn delete_regional_price(
        &self,
        owner_id: &str,
        service_id: &str,
        area_id: &str,
    ) -> Result<bool>;
}

/// Appointment storage (`appointments` and `appointment_services` collections)
#[async_trait]
pub trait AppointmentStorage: Send + Sync {
    /// Store the appointment row only; lines go through `store_service_lines`
    async fn store_appointment(&self, appointment: &Appointment) -> Result<()>;

    async fn store_service_lines(
        &self,
        owner_id: &str,
        lines: &[AppointmentServiceLine],
    ) -> Result<()>;

    /// Fetch an appointment together with its service lines
    async fn get_appointment(&self, owner_id: &str, appointment_id: &str)
        -> Result<Option<Appointment>>;

    /// Ordered by scheduled date (unscheduled last), then creation time
    async fn list_appointments(
        &self,
        owner_id: &str,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>>;

    /// Appointments of a client in an area, optionally at an exact date and time
    async fn find_appointments_for_client_area(
        &self,
        owner_id: &str,
        client_id: &str,
        area_id: &str,
        schedule: Option<(NaiveDate, &str)>,
    ) -> Result<Vec<Appointment>>;

    /// Update the appointment row (lines are immutable after creation)
    async fn update_appointment(&self, appointment: &Appointment) -> Result<bool>;

    /// Hard delete, used only to compensate a failed creation
    async fn delete_appointment(&self, owner_id: &str, appointment_id: &str) -> Result<bool>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type and provides factory
/// methods for creating repositories, so the domain layer works with any
/// storage backend without knowing the implementation details.
pub trait Connection: Send + Sync + Clone + 'static {
    type ProfileRepository: ProfileStorage + Clone + 'static;
    type ClientRepository: ClientStorage + Clone + 'static;
    type CatalogRepository: CatalogStorage + Clone + 'static;
    type AppointmentRepository: AppointmentStorage + Clone + 'static;

    fn create_profile_repository(&self) -> Self::ProfileRepository;
    fn create_client_repository(&self) -> Self::ClientRepository;
    fn create_catalog_repository(&self) -> Self::CatalogRepository;
    fn create_appointment_repository(&self) -> Self::AppointmentRepository;
}
