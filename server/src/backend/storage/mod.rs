//! # Storage Module
//!
//! Handles all data persistence for the studio desk backend.
//!
//! The domain layer only sees the traits in [`traits`]; the SQLite
//! implementation lives in [`sqlite`] and the PDF object store in
//! [`documents`].
//!
//! ## Collections
//!
//! - **profiles**: one operator profile per owner
//! - **clients**: the client roster
//! - **service_categories / services / service_areas**: the priced catalog
//! - **service_regional_prices**: per (service, area) price overrides
//! - **appointments / appointment_services**: bookings and their price snapshot
//!
//! Every row carries the owner id and every query is scoped by it.

pub mod documents;
pub mod sqlite;
pub mod traits;

// Re-export the main types that other modules need
pub use documents::{DocumentStore, LocalDocumentStore};
pub use sqlite::{
    AppointmentRepository, CatalogRepository, ClientRepository, DbConnection, ProfileRepository,
};
pub use traits::*;
