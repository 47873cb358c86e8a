pub mod appointment_repository;
pub mod catalog_repository;
pub mod client_repository;
pub mod profile_repository;

pub use appointment_repository::AppointmentRepository;
pub use catalog_repository::CatalogRepository;
pub use client_repository::ClientRepository;
pub use profile_repository::ProfileRepository;
