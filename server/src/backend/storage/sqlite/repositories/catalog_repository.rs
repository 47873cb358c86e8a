use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use shared::{RegionalPrice, Service, ServiceArea, ServiceCategory};

use crate::backend::storage::sqlite::connection::DbConnection;
use crate::backend::storage::traits::CatalogStorage;

/// Repository for categories, services, areas and regional prices
#[derive(Clone)]
pub struct CatalogRepository {
    db: DbConnection,
}

impl CatalogRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_service(row: &SqliteRow) -> Service {
        Service {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            name: row.get("name"),
            category: row.get("category"),
            standard_price: row.get("standard_price"),
            duration_minutes: row.get::<i64, _>("duration_minutes").max(0) as u32,
            description: row.get("description"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn map_area(row: &SqliteRow) -> ServiceArea {
        ServiceArea {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            name: row.get("name"),
            travel_fee: row.get("travel_fee"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl CatalogStorage for CatalogRepository {
    async fn store_category(&self, category: &ServiceCategory) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO service_categories (id, owner_id, name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.owner_id)
        .bind(&category.name)
        .bind(&category.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn list_categories(&self, owner_id: &str) -> Result<Vec<ServiceCategory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, created_at
            FROM service_categories
            WHERE owner_id = ?
            ORDER BY name COLLATE NOCASE ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| ServiceCategory {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn delete_category(&self, owner_id: &str, category_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM service_categories WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(category_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn store_service(&self, service: &Service) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO services (id, owner_id, name, category, standard_price, duration_minutes, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.id)
        .bind(&service.owner_id)
        .bind(&service.name)
        .bind(&service.category)
        .bind(service.standard_price)
        .bind(i64::from(service.duration_minutes))
        .bind(&service.description)
        .bind(&service.created_at)
        .bind(&service.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_service(&self, owner_id: &str, service_id: &str) -> Result<Option<Service>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, category, standard_price, duration_minutes, description, created_at, updated_at
            FROM services
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(owner_id)
        .bind(service_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(Self::map_service))
    }

    async fn list_services(&self, owner_id: &str) -> Result<Vec<Service>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, category, standard_price, duration_minutes, description, created_at, updated_at
            FROM services
            WHERE owner_id = ?
            ORDER BY category COLLATE NOCASE ASC, name COLLATE NOCASE ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::map_service).collect())
    }

    async fn update_service(&self, service: &Service) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET name = ?, category = ?, standard_price = ?, duration_minutes = ?, description = ?, updated_at = ?
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(&service.name)
        .bind(&service.category)
        .bind(service.standard_price)
        .bind(i64::from(service.duration_minutes))
        .bind(&service.description)
        .bind(&service.updated_at)
        .bind(&service.owner_id)
        .bind(&service.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_service(&self, owner_id: &str, service_id: &str) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM service_regional_prices WHERE owner_id = ? AND service_id = ?")
            .bind(owner_id)
            .bind(service_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM services WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(service_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn store_area(&self, area: &ServiceArea) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO service_areas (id, owner_id, name, travel_fee, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&area.id)
        .bind(&area.owner_id)
        .bind(&area.name)
        .bind(area.travel_fee)
        .bind(&area.created_at)
        .bind(&area.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_area(&self, owner_id: &str, area_id: &str) -> Result<Option<ServiceArea>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, travel_fee, created_at, updated_at
            FROM service_areas
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(owner_id)
        .bind(area_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(Self::map_area))
    }

    async fn list_areas(&self, owner_id: &str) -> Result<Vec<ServiceArea>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, travel_fee, created_at, updated_at
            FROM service_areas
            WHERE owner_id = ?
            ORDER BY name COLLATE NOCASE ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::map_area).collect())
    }

    async fn update_area(&self, area: &ServiceArea) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE service_areas
            SET name = ?, travel_fee = ?, updated_at = ?
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(&area.name)
        .bind(area.travel_fee)
        .bind(&area.updated_at)
        .bind(&area.owner_id)
        .bind(&area.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_area(&self, owner_id: &str, area_id: &str) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM service_regional_prices WHERE owner_id = ? AND area_id = ?")
            .bind(owner_id)
            .bind(area_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM service_areas WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(area_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_regional_price(&self, price: &RegionalPrice) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO service_regional_prices (owner_id, service_id, area_id, price, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(owner_id, service_id, area_id) DO UPDATE SET
                price = excluded.price,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&price.owner_id)
        .bind(&price.service_id)
        .bind(&price.area_id)
        .bind(price.price)
        .bind(&price.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn list_regional_prices(&self, owner_id: &str) -> Result<Vec<RegionalPrice>> {
        let rows = sqlx::query(
            r#"
            SELECT owner_id, service_id, area_id, price, updated_at
            FROM service_regional_prices
            WHERE owner_id = ?
            ORDER BY area_id, service_id
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| RegionalPrice {
                owner_id: row.get("owner_id"),
                service_id: row.get("service_id"),
                area_id: row.get("area_id"),
                price: row.get("price"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    async fn delete_regional_price(
        &self,
        owner_id: &str,
        service_id: &str,
        area_id: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM service_regional_prices WHERE owner_id = ? AND service_id = ? AND area_id = ?",
        )
        .bind(owner_id)
        .bind(service_id)
        .bind(area_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
