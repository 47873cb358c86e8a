use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use shared::Client;

use crate::backend::storage::sqlite::connection::DbConnection;
use crate::backend::storage::traits::ClientStorage;

/// Repository for the client roster
#[derive(Clone)]
pub struct ClientRepository {
    db: DbConnection,
}

impl ClientRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_row(row: &SqliteRow) -> Client {
        Client {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            name: row.get("name"),
            phone: row.get("phone"),
            email: row.get("email"),
            address: row.get("address"),
            instagram: row.get("instagram"),
            notes: row.get("notes"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl ClientStorage for ClientRepository {
    async fn store_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, owner_id, name, phone, email, address, instagram, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&client.id)
        .bind(&client.owner_id)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(&client.instagram)
        .bind(&client.notes)
        .bind(&client.created_at)
        .bind(&client.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_client(&self, owner_id: &str, client_id: &str) -> Result<Option<Client>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, phone, email, address, instagram, notes, created_at, updated_at
            FROM clients
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(owner_id)
        .bind(client_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(Self::map_row))
    }

    async fn list_clients(&self, owner_id: &str) -> Result<Vec<Client>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, phone, email, address, instagram, notes, created_at, updated_at
            FROM clients
            WHERE owner_id = ?
            ORDER BY name COLLATE NOCASE ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::map_row).collect())
    }

    async fn update_client(&self, client: &Client) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = ?, phone = ?, email = ?, address = ?, instagram = ?, notes = ?, updated_at = ?
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(&client.instagram)
        .bind(&client.notes)
        .bind(&client.updated_at)
        .bind(&client.owner_id)
        .bind(&client.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_client(&self, owner_id: &str, client_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM clients WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(client_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str, owner_id: &str, name: &str) -> Client {
        Client {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            phone: "11988887777".to_string(),
            email: None,
            address: Some("Rua das Flores, 10".to_string()),
            instagram: None,
            notes: None,
            created_at: "2025-03-01T09:00:00+00:00".to_string(),
            updated_at: "2025-03-01T09:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_is_scoped_by_owner_and_sorted() {
        let repo = ClientRepository::new(DbConnection::init_test().await.unwrap());
        repo.store_client(&client("c1", "owner-1", "marina")).await.unwrap();
        repo.store_client(&client("c2", "owner-1", "Ana")).await.unwrap();
        repo.store_client(&client("c3", "owner-2", "Bruna")).await.unwrap();

        let clients = repo.list_clients("owner-1").await.unwrap();
        let names: Vec<&str> = clients.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "marina"]);

        assert!(repo.get_client("owner-2", "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let repo = ClientRepository::new(DbConnection::init_test().await.unwrap());
        let mut stored = client("c1", "owner-1", "Ana");
        repo.store_client(&stored).await.unwrap();

        stored.phone = "11911112222".to_string();
        assert!(repo.update_client(&stored).await.unwrap());
        assert_eq!(
            repo.get_client("owner-1", "c1").await.unwrap().unwrap().phone,
            "11911112222"
        );

        // another owner cannot touch the row
        let mut foreign = stored.clone();
        foreign.owner_id = "owner-2".to_string();
        assert!(!repo.update_client(&foreign).await.unwrap());
        assert!(!repo.delete_client("owner-2", "c1").await.unwrap());

        assert!(repo.delete_client("owner-1", "c1").await.unwrap());
        assert!(!repo.delete_client("owner-1", "c1").await.unwrap());
    }
}
