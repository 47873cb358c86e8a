//! # Pricing Engine
//!
//! Turns a service selection into a priced quote. This is the one place where
//! unit prices, travel fees, totals and durations are decided; the record
//! builder and the quote endpoint both call [`calculate_quote`].
//!
//! ## Rules
//!
//! - A regional override for (service, area) replaces the standard price and
//!   already includes travel cost.
//! - The area travel fee is added only when requested, when no selected line
//!   uses an override, and when the fee is positive.
//! - Manual mode replaces the total with the typed price and fixes the
//!   duration at [`MANUAL_PRICE_DURATION_MINUTES`].
//! - No selected services means zero totals (manual mode still uses the typed
//!   price).
//!
//! The engine is a pure function over an immutable catalog snapshot; every
//! input change is recomputed from scratch.

use std::collections::HashMap;

use shared::{Quote, QuoteInput, QuoteLine, RegionalPrice, Service, ServiceArea};
use thiserror::Error;

use crate::backend::domain::money::{parse_amount, round_cents};

/// Duration booked for a differentiated (manual) price
pub const MANUAL_PRICE_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("Service not found: {0}")]
    UnknownService(String),
    #[error("Service area not found: {0}")]
    UnknownArea(String),
    #[error("Quantity must be at least 1 for service {0}")]
    ZeroQuantity(String),
    #[error("Quantity too large for service {0}")]
    QuantityTooLarge(String),
    #[error("Enter the differentiated price")]
    MissingManualPrice,
    #[error("Invalid differentiated price: {0}")]
    InvalidManualPrice(String),
}

/// Read-only snapshot of an owner's priced catalog
#[derive(Debug, Clone, Default)]
pub struct PricingCatalog {
    services: HashMap<String, Service>,
    areas: HashMap<String, ServiceArea>,
    regional_prices: HashMap<(String, String), f64>,
}

impl PricingCatalog {
    pub fn new(
        services: Vec<Service>,
        areas: Vec<ServiceArea>,
        regional_prices: Vec<RegionalPrice>,
    ) -> Self {
        Self {
            services: services.into_iter().map(|s| (s.id.clone(), s)).collect(),
            areas: areas.into_iter().map(|a| (a.id.clone(), a)).collect(),
            regional_prices: regional_prices
                .into_iter()
                .map(|p| ((p.service_id, p.area_id), p.price))
                .collect(),
        }
    }

    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.get(service_id)
    }

    pub fn area(&self, area_id: &str) -> Option<&ServiceArea> {
        self.areas.get(area_id)
    }

    pub fn regional_price(&self, service_id: &str, area_id: &str) -> Option<f64> {
        self.regional_prices
            .get(&(service_id.to_string(), area_id.to_string()))
            .copied()
    }
}

/// Parse and validate the operator-typed manual price. Must be positive.
pub fn parse_manual_price(raw: Option<&str>) -> Result<f64, PricingError> {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(PricingError::MissingManualPrice),
    };

    match parse_amount(raw) {
        Ok(amount) if amount > 0.0 => Ok(amount),
        _ => Err(PricingError::InvalidManualPrice(raw.to_string())),
    }
}

/// Price a selection against the catalog
pub fn calculate_quote(catalog: &PricingCatalog, input: &QuoteInput) -> Result<Quote, PricingError> {
    let area = match input.area_id.as_deref() {
        Some(area_id) => Some(
            catalog
                .area(area_id)
                .ok_or_else(|| PricingError::UnknownArea(area_id.to_string()))?,
        ),
        None => None,
    };

    let mut lines = Vec::with_capacity(input.services.len());
    for selected in &input.services {
        if selected.quantity == 0 {
            return Err(PricingError::ZeroQuantity(selected.service_id.clone()));
        }
        let service = catalog
            .service(&selected.service_id)
            .ok_or_else(|| PricingError::UnknownService(selected.service_id.clone()))?;

        let override_price =
            area.and_then(|area| catalog.regional_price(&service.id, &area.id));
        let unit_price = override_price.unwrap_or(service.standard_price);
        let duration_minutes = service
            .duration_minutes
            .checked_mul(selected.quantity)
            .ok_or_else(|| PricingError::QuantityTooLarge(selected.service_id.clone()))?;

        lines.push(QuoteLine {
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            quantity: selected.quantity,
            unit_price,
            total_price: round_cents(unit_price * f64::from(selected.quantity)),
            duration_minutes,
            regional_price: override_price.is_some(),
        });
    }

    let services_total = round_cents(lines.iter().map(|l| l.total_price).sum());
    let has_any_regional_price = lines.iter().any(|l| l.regional_price);

    if input.use_manual_price {
        let manual_total = parse_manual_price(input.manual_price.as_deref())?;
        return Ok(Quote {
            lines,
            services_total,
            has_any_regional_price,
            travel_fee: 0.0,
            total: manual_total,
            total_duration_minutes: MANUAL_PRICE_DURATION_MINUTES,
            manual_price: true,
        });
    }

    if lines.is_empty() {
        return Ok(Quote {
            lines,
            services_total: 0.0,
            has_any_regional_price: false,
            travel_fee: 0.0,
            total: 0.0,
            total_duration_minutes: 0,
            manual_price: false,
        });
    }

    let travel_fee = match area {
        Some(area) if input.include_travel_fee && !has_any_regional_price && area.travel_fee > 0.0 => {
            area.travel_fee
        }
        _ => 0.0,
    };

    let total_duration_minutes = lines.iter().try_fold(0u32, |acc, l| {
        acc.checked_add(l.duration_minutes)
            .ok_or_else(|| PricingError::QuantityTooLarge(l.service_id.clone()))
    })?;

    Ok(Quote {
        total: round_cents(services_total + travel_fee),
        lines,
        services_total,
        has_any_regional_price,
        travel_fee,
        total_duration_minutes,
        manual_price: false,
    })
}
