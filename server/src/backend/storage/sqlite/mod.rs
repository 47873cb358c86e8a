//! # SQLite Storage Module
//!
//! SQLite-based implementations of the storage traits.
//!
//! ## Components
//!
//! - **connection.rs** - pool management, schema setup and the repository factory
//! - **repositories/** - one repository per collection group

pub mod connection;
pub mod repositories;

pub use connection::DbConnection;
pub use repositories::{
    AppointmentRepository, CatalogRepository, ClientRepository, ProfileRepository,
};
