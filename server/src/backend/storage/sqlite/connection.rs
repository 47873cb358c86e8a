use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use super::repositories::{
    AppointmentRepository, CatalogRepository, ClientRepository, ProfileRepository,
};
use crate::backend::storage::traits::Connection;

/// DbConnection manages the SQLite pool and the schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Connect to the database at `url`, creating file and schema if missing
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        info!("Connected to database {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a private in-memory database for a single test
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // one connection: every ":memory:" connection is its own database
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                owner_id TEXT PRIMARY KEY,
                business_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT,
                message_signature TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT,
                address TEXT,
                instagram TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_clients_owner_name
            ON clients(owner_id, name);
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS service_categories (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (owner_id, name)
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS services (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                standard_price REAL NOT NULL,
                duration_minutes INTEGER NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS service_areas (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                travel_fee REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
            // one override per (service, area) pair
            r#"
            CREATE TABLE IF NOT EXISTS service_regional_prices (
                owner_id TEXT NOT NULL,
                service_id TEXT NOT NULL,
                area_id TEXT NOT NULL,
                price REAL NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (owner_id, service_id, area_id)
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                area_id TEXT NOT NULL,
                scheduled_date TEXT,
                scheduled_time TEXT,
                status TEXT NOT NULL,
                address TEXT,
                use_manual_price BOOLEAN NOT NULL DEFAULT FALSE,
                include_travel_fee BOOLEAN NOT NULL DEFAULT FALSE,
                travel_fee REAL NOT NULL DEFAULT 0,
                total_value REAL NOT NULL,
                amount_received REAL NOT NULL DEFAULT 0,
                payment_status TEXT NOT NULL,
                total_duration_minutes INTEGER NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_appointments_owner_date
            ON appointments(owner_id, scheduled_date);
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_appointments_client_area
            ON appointments(owner_id, client_id, area_id);
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS appointment_services (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                appointment_id TEXT NOT NULL,
                service_id TEXT NOT NULL,
                service_name TEXT NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity > 0),
                unit_price REAL NOT NULL,
                total_price REAL NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (appointment_id) REFERENCES appointments (id) ON DELETE CASCADE
            );
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_appointment_services_appointment
            ON appointment_services(appointment_id);
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(pool).await?;
        }

        Ok(())
    }
}

impl Connection for DbConnection {
    type ProfileRepository = ProfileRepository;
    type ClientRepository = ClientRepository;
    type CatalogRepository = CatalogRepository;
    type AppointmentRepository = AppointmentRepository;

    fn create_profile_repository(&self) -> Self::ProfileRepository {
        ProfileRepository::new(self.clone())
    }

    fn create_client_repository(&self) -> Self::ClientRepository {
        ClientRepository::new(self.clone())
    }

    fn create_catalog_repository(&self) -> Self::CatalogRepository {
        CatalogRepository::new(self.clone())
    }

    fn create_appointment_repository(&self) -> Self::AppointmentRepository {
        AppointmentRepository::new(self.clone())
    }
}
