//! # Domain Module
//!
//! Contains all business logic for the studio desk: pricing, booking,
//! payments and the money overview.
//!
//! It operates independently of the HTTP layer and of the storage backend;
//! services are generic over [`crate::backend::storage::Connection`].
//!
//! ## Module Organization
//!
//! - **money**: Cent rounding, BRL parsing and formatting
//! - **pricing**: Quote calculation from services, areas and regional prices
//! - **appointment_builder**: Validation and assembly of appointment records
//! - **appointment_service**: Booking flow with payment gate and duplicate guard
//! - **financial_service**: Received/pending aggregation over time windows
//! - **export_service**: CSV export of appointments
//! - **client_service**, **profile_service**, **catalog_service**: CRUD
//! - **document_service**: PDF uploads and public links
//! - **messaging_service**: WhatsApp delivery and message templates
//!
//! ## Business Rules
//!
//! - A manual price replaces the whole quote; no travel fee is added
//! - The travel fee is dropped as soon as one line has a regional price
//! - Only confirmed and completed appointments count as revenue
//! - A completed appointment is always fully paid
//! - All money values are rounded to cents

pub mod appointment_builder;
pub mod appointment_service;
pub mod catalog_service;
pub mod client_service;
pub mod document_service;
pub mod export_service;
pub mod financial_service;
pub mod messaging_service;
pub mod money;
pub mod pricing;
pub mod profile_service;

pub use appointment_builder::AppointmentError;
pub use appointment_service::AppointmentService;
pub use catalog_service::{CatalogError, CatalogService};
pub use client_service::{ClientError, ClientService};
pub use document_service::{DocumentError, DocumentService};
pub use export_service::ExportService;
pub use financial_service::FinancialService;
pub use messaging_service::{MessagingError, MessagingService, WhatsAppGateway};
pub use pricing::{calculate_quote, PricingCatalog, PricingError};
pub use profile_service::{ProfileError, ProfileService};
