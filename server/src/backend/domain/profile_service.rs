//! Operator profile: business name, sender phone and the signature appended
//! to outgoing messages.

use anyhow::Result;
use chrono::Utc;
use shared::{Profile, UpsertProfileRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::backend::storage::{Connection, ProfileStorage};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Profile not found for owner {0}")]
    NotFound(String),
}

#[derive(Clone)]
pub struct ProfileService<C: Connection> {
    profile_repository: C::ProfileRepository,
}

impl<C: Connection> ProfileService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            profile_repository: connection.create_profile_repository(),
        }
    }

    /// Profile of the owner, if one was saved
    pub async fn find_profile(&self, owner_id: &str) -> Result<Option<Profile>> {
        self.profile_repository.get_profile(owner_id).await
    }

    pub async fn get_profile(&self, owner_id: &str) -> Result<Profile> {
        self.find_profile(owner_id)
            .await?
            .ok_or_else(|| ProfileError::NotFound(owner_id.to_string()).into())
    }

    pub async fn upsert_profile(&self, owner_id: &str, request: UpsertProfileRequest) -> Result<Profile> {
        let mut errors = Vec::new();
        if request.business_name.trim().is_empty() {
            errors.push("Business name is required".to_string());
        }
        if request.phone.trim().is_empty() {
            errors.push("Phone is required".to_string());
        }
        if !errors.is_empty() {
            return Err(ProfileError::Validation(errors).into());
        }

        let now = Utc::now().to_rfc3339();
        let created_at = match self.find_profile(owner_id).await? {
            Some(existing) => existing.created_at,
            None => now.clone(),
        };

        let profile = Profile {
            owner_id: owner_id.to_string(),
            business_name: request.business_name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            email: request.email.filter(|e| !e.trim().is_empty()),
            message_signature: request.message_signature.filter(|s| !s.trim().is_empty()),
            created_at,
            updated_at: now,
        };

        self.profile_repository.upsert_profile(&profile).await?;
        info!("Saved profile for owner {}", owner_id);
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::DbConnection;

    #[tokio::test]
    async fn test_missing_profile_is_not_found() {
        let service = ProfileService::new(Arc::new(DbConnection::init_test().await.unwrap()));
        let err = service.get_profile("owner-1").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ProfileError>(), Some(ProfileError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upsert_validates_and_saves() {
        let service = ProfileService::new(Arc::new(DbConnection::init_test().await.unwrap()));

        let invalid = UpsertProfileRequest {
            business_name: " ".to_string(),
            phone: "5511988887777".to_string(),
            email: None,
            message_signature: None,
        };
        assert!(service.upsert_profile("owner-1", invalid).await.is_err());

        let saved = service
            .upsert_profile(
                "owner-1",
                UpsertProfileRequest {
                    business_name: "Studio Bela".to_string(),
                    phone: "5511988887777".to_string(),
                    email: Some("".to_string()),
                    message_signature: Some("Beijos, Bela".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.email, None);

        let loaded = service.get_profile("owner-1").await.unwrap();
        assert_eq!(loaded.message_signature.as_deref(), Some("Beijos, Bela"));
    }
}
