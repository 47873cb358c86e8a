use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;
use shared::Profile;

use crate::backend::storage::sqlite::connection::DbConnection;
use crate::backend::storage::traits::ProfileStorage;

/// Repository for operator profiles
#[derive(Clone)]
pub struct ProfileRepository {
    db: DbConnection,
}

impl ProfileRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStorage for ProfileRepository {
    async fn get_profile(&self, owner_id: &str) -> Result<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT owner_id, business_name, phone, email, message_signature, created_at, updated_at
            FROM profiles
            WHERE owner_id = ?
            "#,
        )
        .bind(owner_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| Profile {
            owner_id: r.get("owner_id"),
            business_name: r.get("business_name"),
            phone: r.get("phone"),
            email: r.get("email"),
            message_signature: r.get("message_signature"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        // created_at of an existing row is kept
        sqlx::query(
            r#"
            INSERT INTO profiles (owner_id, business_name, phone, email, message_signature, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_id) DO UPDATE SET
                business_name = excluded.business_name,
                phone = excluded.phone,
                email = excluded.email,
                message_signature = excluded.message_signature,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.owner_id)
        .bind(&profile.business_name)
        .bind(&profile.phone)
        .bind(&profile.email)
        .bind(&profile.message_signature)
        .bind(&profile.created_at)
        .bind(&profile.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(owner_id: &str, name: &str, stamp: &str) -> Profile {
        Profile {
            owner_id: owner_id.to_string(),
            business_name: name.to_string(),
            phone: "5511988887777".to_string(),
            email: None,
            message_signature: Some("Até breve!".to_string()),
            created_at: stamp.to_string(),
            updated_at: stamp.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let repo = ProfileRepository::new(DbConnection::init_test().await.unwrap());

        repo.upsert_profile(&profile("owner-1", "Studio A", "2025-01-01T10:00:00+00:00"))
            .await
            .unwrap();
        repo.upsert_profile(&profile("owner-1", "Studio B", "2025-02-01T10:00:00+00:00"))
            .await
            .unwrap();

        let stored = repo.get_profile("owner-1").await.unwrap().unwrap();
        assert_eq!(stored.business_name, "Studio B");
        assert_eq!(stored.created_at, "2025-01-01T10:00:00+00:00");
        assert_eq!(stored.updated_at, "2025-02-01T10:00:00+00:00");

        assert!(repo.get_profile("owner-2").await.unwrap().is_none());
    }
}
