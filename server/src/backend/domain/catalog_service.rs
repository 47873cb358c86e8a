//! # Catalog Service
//!
//! CRUD over the priced catalog of an owner: service categories, services,
//! service areas and regional price overrides. Also loads the
//! [`PricingCatalog`] snapshot the pricing engine runs against and serves
//! stand-alone quotes.
//!
//! ## Business Rules
//!
//! - Category names are unique per owner (case-insensitive)
//! - Prices and travel fees are never negative; regional overrides are positive
//! - Services need a name, a category and a positive duration
//! - An override can only reference an existing service and area

use anyhow::Result;
use chrono::Utc;
use shared::{
    CreateCategoryRequest, Quote, QuoteInput, RegionalPrice, Service, ServiceArea,
    ServiceAreaRequest, ServiceCategory, ServiceRequest, UpsertRegionalPriceRequest,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::domain::money::round_cents;
use crate::backend::domain::pricing::{calculate_quote, PricingCatalog};
use crate::backend::storage::{CatalogStorage, Connection};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Category already exists: {0}")]
    DuplicateCategory(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Service not found: {0}")]
    ServiceNotFound(String),
    #[error("Service area not found: {0}")]
    AreaNotFound(String),
    #[error("No regional price for service {service_id} in area {area_id}")]
    RegionalPriceNotFound { service_id: String, area_id: String },
}

fn validation(errors: Vec<String>) -> Result<(), CatalogError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Validation(errors))
    }
}

fn validate_service(request: &ServiceRequest) -> Result<(), CatalogError> {
    let mut errors = Vec::new();
    if request.name.trim().is_empty() {
        errors.push("Service name is required".to_string());
    }
    if request.category.trim().is_empty() {
        errors.push("Service category is required".to_string());
    }
    if !request.standard_price.is_finite() || request.standard_price < 0.0 {
        errors.push("Standard price cannot be negative".to_string());
    }
    if request.duration_minutes == 0 {
        errors.push("Duration must be at least 1 minute".to_string());
    }
    validation(errors)
}

fn validate_area(request: &ServiceAreaRequest) -> Result<(), CatalogError> {
    let mut errors = Vec::new();
    if request.name.trim().is_empty() {
        errors.push("Area name is required".to_string());
    }
    if !request.travel_fee.is_finite() || request.travel_fee < 0.0 {
        errors.push("Travel fee cannot be negative".to_string());
    }
    validation(errors)
}

fn description(value: Option<String>) -> Option<String> {
    value.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

#[derive(Clone)]
pub struct CatalogService<C: Connection> {
    catalog_repository: C::CatalogRepository,
}

impl<C: Connection> CatalogService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            catalog_repository: connection.create_catalog_repository(),
        }
    }

    // -- categories ---------------------------------------------------------

    pub async fn create_category(&self, owner_id: &str, request: CreateCategoryRequest) -> Result<ServiceCategory> {
        let name = request.name.trim().to_string();
        validation(if name.is_empty() {
            vec!["Category name is required".to_string()]
        } else {
            Vec::new()
        })?;

        let existing = self.catalog_repository.list_categories(owner_id).await?;
        if existing.iter().any(|c| c.name.to_lowercase() == name.to_lowercase()) {
            return Err(CatalogError::DuplicateCategory(name).into());
        }

        let category = ServiceCategory {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name,
            created_at: Utc::now().to_rfc3339(),
        };
        self.catalog_repository.store_category(&category).await?;
        info!("Created category {} for owner {}", category.name, owner_id);
        Ok(category)
    }

    pub async fn list_categories(&self, owner_id: &str) -> Result<Vec<ServiceCategory>> {
        self.catalog_repository.list_categories(owner_id).await
    }

    pub async fn delete_category(&self, owner_id: &str, category_id: &str) -> Result<()> {
        if !self.catalog_repository.delete_category(owner_id, category_id).await? {
            return Err(CatalogError::CategoryNotFound(category_id.to_string()).into());
        }
        info!("Deleted category {} for owner {}", category_id, owner_id);
        Ok(())
    }

    // -- services -----------------------------------------------------------

    pub async fn create_service(&self, owner_id: &str, request: ServiceRequest) -> Result<Service> {
        validate_service(&request)?;

        let now = Utc::now().to_rfc3339();
        let service = Service {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: request.name.trim().to_string(),
            category: request.category.trim().to_string(),
            standard_price: round_cents(request.standard_price),
            duration_minutes: request.duration_minutes,
            description: description(request.description),
            created_at: now.clone(),
            updated_at: now,
        };
        self.catalog_repository.store_service(&service).await?;
        info!("Created service {} ({}) for owner {}", service.name, service.id, owner_id);
        Ok(service)
    }

    pub async fn list_services(&self, owner_id: &str) -> Result<Vec<Service>> {
        self.catalog_repository.list_services(owner_id).await
    }

    pub async fn update_service(&self, owner_id: &str, service_id: &str, request: ServiceRequest) -> Result<Service> {
        validate_service(&request)?;

        let mut service = self
            .catalog_repository
            .get_service(owner_id, service_id)
            .await?
            .ok_or_else(|| CatalogError::ServiceNotFound(service_id.to_string()))?;

        service.name = request.name.trim().to_string();
        service.category = request.category.trim().to_string();
        service.standard_price = round_cents(request.standard_price);
        service.duration_minutes = request.duration_minutes;
        service.description = description(request.description);
        service.updated_at = Utc::now().to_rfc3339();

        if !self.catalog_repository.update_service(&service).await? {
            return Err(CatalogError::ServiceNotFound(service_id.to_string()).into());
        }
        info!("Updated service {} for owner {}", service_id, owner_id);
        Ok(service)
    }

    pub async fn delete_service(&self, owner_id: &str, service_id: &str) -> Result<()> {
        if !self.catalog_repository.delete_service(owner_id, service_id).await? {
            return Err(CatalogError::ServiceNotFound(service_id.to_string()).into());
        }
        info!("Deleted service {} for owner {}", service_id, owner_id);
        Ok(())
    }

    // -- areas --------------------------------------------------------------

    pub async fn create_area(&self, owner_id: &str, request: ServiceAreaRequest) -> Result<ServiceArea> {
        validate_area(&request)?;

        let now = Utc::now().to_rfc3339();
        let area = ServiceArea {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: request.name.trim().to_string(),
            travel_fee: round_cents(request.travel_fee),
            created_at: now.clone(),
            updated_at: now,
        };
        self.catalog_repository.store_area(&area).await?;
        info!("Created area {} ({}) for owner {}", area.name, area.id, owner_id);
        Ok(area)
    }

    pub async fn list_areas(&self, owner_id: &str) -> Result<Vec<ServiceArea>> {
        self.catalog_repository.list_areas(owner_id).await
    }

    pub async fn update_area(&self, owner_id: &str, area_id: &str, request: ServiceAreaRequest) -> Result<ServiceArea> {
        validate_area(&request)?;

        let mut area = self
            .catalog_repository
            .get_area(owner_id, area_id)
            .await?
            .ok_or_else(|| CatalogError::AreaNotFound(area_id.to_string()))?;

        area.name = request.name.trim().to_string();
        area.travel_fee = round_cents(request.travel_fee);
        area.updated_at = Utc::now().to_rfc3339();

        if !self.catalog_repository.update_area(&area).await? {
            return Err(CatalogError::AreaNotFound(area_id.to_string()).into());
        }
        info!("Updated area {} for owner {}", area_id, owner_id);
        Ok(area)
    }

    pub async fn delete_area(&self, owner_id: &str, area_id: &str) -> Result<()> {
        if !self.catalog_repository.delete_area(owner_id, area_id).await? {
            return Err(CatalogError::AreaNotFound(area_id.to_string()).into());
        }
        info!("Deleted area {} for owner {}", area_id, owner_id);
        Ok(())
    }

    // -- regional prices ----------------------------------------------------

    pub async fn list_regional_prices(&self, owner_id: &str) -> Result<Vec<RegionalPrice>> {
        self.catalog_repository.list_regional_prices(owner_id).await
    }

    pub async fn upsert_regional_price(
        &self,
        owner_id: &str,
        request: UpsertRegionalPriceRequest,
    ) -> Result<RegionalPrice> {
        validation(if !request.price.is_finite() || request.price <= 0.0 {
            vec!["Regional price must be greater than zero".to_string()]
        } else {
            Vec::new()
        })?;

        if self
            .catalog_repository
            .get_service(owner_id, &request.service_id)
            .await?
            .is_none()
        {
            return Err(CatalogError::ServiceNotFound(request.service_id).into());
        }
        if self
            .catalog_repository
            .get_area(owner_id, &request.area_id)
            .await?
            .is_none()
        {
            return Err(CatalogError::AreaNotFound(request.area_id).into());
        }

        let price = RegionalPrice {
            owner_id: owner_id.to_string(),
            service_id: request.service_id,
            area_id: request.area_id,
            price: round_cents(request.price),
            updated_at: Utc::now().to_rfc3339(),
        };
        self.catalog_repository.upsert_regional_price(&price).await?;
        info!(
            "Set regional price {:.2} for service {} in area {} (owner {})",
            price.price, price.service_id, price.area_id, owner_id
        );
        Ok(price)
    }

    pub async fn delete_regional_price(&self, owner_id: &str, service_id: &str, area_id: &str) -> Result<()> {
        if !self
            .catalog_repository
            .delete_regional_price(owner_id, service_id, area_id)
            .await?
        {
            return Err(CatalogError::RegionalPriceNotFound {
                service_id: service_id.to_string(),
                area_id: area_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    // -- pricing ------------------------------------------------------------

    /// Snapshot of everything the pricing engine reads
    pub async fn pricing_catalog(&self, owner_id: &str) -> Result<PricingCatalog> {
        let services = self.catalog_repository.list_services(owner_id).await?;
        let areas = self.catalog_repository.list_areas(owner_id).await?;
        let regional_prices = self.catalog_repository.list_regional_prices(owner_id).await?;
        debug!(
            "Loaded pricing catalog for owner {}: {} services, {} areas, {} overrides",
            owner_id,
            services.len(),
            areas.len(),
            regional_prices.len()
        );
        Ok(PricingCatalog::new(services, areas, regional_prices))
    }

    pub async fn quote(&self, owner_id: &str, input: &QuoteInput) -> Result<Quote> {
        let catalog = self.pricing_catalog(owner_id).await?;
        Ok(calculate_quote(&catalog, input)?)
    }
}
