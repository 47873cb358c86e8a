//! # IO Module
//!
//! Provides the interface layer between the outside world and the domain logic.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: REST endpoints consumed by the studio web app
//! - **Error Translation**: Converting domain errors to HTTP status codes
//! - **Authentication**: Owner id and optional API key checks
//! - **Outbound Integration**: HTTP client for the WhatsApp automation process
//!
//! ## Current Implementation
//!
//! - **Web Framework**: Axum handlers, services injected via `State`
//! - **Serialization**: Serde JSON bodies, CSV and raw PDF where noted
//! - **HTTP Client**: Reqwest with a per-request timeout

pub mod rest;
pub mod whatsapp;

pub use rest::*;
pub use whatsapp::WhatsAppClient;
