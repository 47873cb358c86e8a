//! Client roster management.
//!
//! Name and phone are mandatory; the remaining contact fields are optional
//! and stored trimmed, with blank input treated as absent.

use anyhow::Result;
use chrono::Utc;
use shared::{
    Client, ClientListResponse, ClientResponse, CreateClientRequest, UpdateClientRequest,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::storage::{ClientStorage, Connection};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Client not found: {0}")]
    NotFound(String),
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_required(name: &str, phone: &str) -> Result<(), ClientError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push("Client name is required".to_string());
    }
    if phone.trim().is_empty() {
        errors.push("Client phone is required".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Validation(errors))
    }
}

#[derive(Clone)]
pub struct ClientService<C: Connection> {
    client_repository: C::ClientRepository,
}

impl<C: Connection> ClientService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            client_repository: connection.create_client_repository(),
        }
    }

    pub async fn create_client(&self, owner_id: &str, request: CreateClientRequest) -> Result<ClientResponse> {
        validate_required(&request.name, &request.phone)?;

        let now = Utc::now().to_rfc3339();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: request.name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            email: optional(request.email),
            address: optional(request.address),
            instagram: optional(request.instagram),
            notes: optional(request.notes),
            created_at: now.clone(),
            updated_at: now,
        };

        self.client_repository.store_client(&client).await?;
        info!("Created client {} ({}) for owner {}", client.name, client.id, owner_id);

        Ok(ClientResponse {
            success_message: format!("Client {} added", client.name),
            client,
        })
    }

    pub async fn get_client(&self, owner_id: &str, client_id: &str) -> Result<Client> {
        match self.client_repository.get_client(owner_id, client_id).await? {
            Some(client) => Ok(client),
            None => {
                warn!("Client not found: {}", client_id);
                Err(ClientError::NotFound(client_id.to_string()).into())
            }
        }
    }

    pub async fn list_clients(&self, owner_id: &str) -> Result<ClientListResponse> {
        let clients = self.client_repository.list_clients(owner_id).await?;
        info!("Found {} clients for owner {}", clients.len(), owner_id);
        Ok(ClientListResponse { clients })
    }

    pub async fn update_client(
        &self,
        owner_id: &str,
        client_id: &str,
        request: UpdateClientRequest,
    ) -> Result<ClientResponse> {
        let mut client = self.get_client(owner_id, client_id).await?;

        if let Some(name) = request.name {
            client.name = name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            client.phone = phone.trim().to_string();
        }
        validate_required(&client.name, &client.phone)?;

        if request.email.is_some() {
            client.email = optional(request.email);
        }
        if request.address.is_some() {
            client.address = optional(request.address);
        }
        if request.instagram.is_some() {
            client.instagram = optional(request.instagram);
        }
        if request.notes.is_some() {
            client.notes = optional(request.notes);
        }
        client.updated_at = Utc::now().to_rfc3339();

        if !self.client_repository.update_client(&client).await? {
            return Err(ClientError::NotFound(client_id.to_string()).into());
        }
        info!("Updated client {} for owner {}", client.id, owner_id);

        Ok(ClientResponse {
            success_message: format!("Client {} updated", client.name),
            client,
        })
    }

    pub async fn delete_client(&self, owner_id: &str, client_id: &str) -> Result<()> {
        if !self.client_repository.delete_client(owner_id, client_id).await? {
            return Err(ClientError::NotFound(client_id.to_string()).into());
        }
        info!("Deleted client {} for owner {}", client_id, owner_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::DbConnection;

    async fn service() -> ClientService<DbConnection> {
        ClientService::new(Arc::new(DbConnection::init_test().await.unwrap()))
    }

    fn request(name: &str, phone: &str) -> CreateClientRequest {
        CreateClientRequest {
            name: name.to_string(),
            phone: phone.to_string(),
            email: Some("  ".to_string()),
            instagram: Some(" @ana ".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_trims_and_drops_blank_fields() {
        let service = service().await;
        let response = service
            .create_client("owner-1", request("  Ana  ", "11 98888-7777"))
            .await
            .unwrap();

        assert_eq!(response.client.name, "Ana");
        assert_eq!(response.client.email, None);
        assert_eq!(response.client.instagram.as_deref(), Some("@ana"));

        let listed = service.list_clients("owner-1").await.unwrap();
        assert_eq!(listed.clients.len(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_name_and_phone() {
        let service = service().await;
        let err = service.create_client("owner-1", request("", " ")).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ClientError>(),
            Some(&ClientError::Validation(vec![
                "Client name is required".to_string(),
                "Client phone is required".to_string(),
            ]))
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = service().await;
        let created = service
            .create_client("owner-1", request("Ana", "11988887777"))
            .await
            .unwrap()
            .client;

        let updated = service
            .update_client(
                "owner-1",
                &created.id,
                UpdateClientRequest { notes: Some("Prefere manhã".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.client.notes.as_deref(), Some("Prefere manhã"));
        assert_eq!(updated.client.instagram.as_deref(), Some("@ana"));

        let blank_name = service
            .update_client(
                "owner-1",
                &created.id,
                UpdateClientRequest { name: Some(" ".to_string()), ..Default::default() },
            )
            .await;
        assert!(blank_name.is_err());

        let foreign = service.get_client("owner-2", &created.id).await.unwrap_err();
        assert!(matches!(foreign.downcast_ref::<ClientError>(), Some(ClientError::NotFound(_))));

        service.delete_client("owner-1", &created.id).await.unwrap();
        assert!(service.delete_client("owner-1", &created.id).await.is_err());
    }
}
