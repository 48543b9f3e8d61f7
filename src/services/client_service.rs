use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::database::Store;
use crate::models::{self, Client, ClientType};
use crate::services::ServiceError;

/// Create, read, update and delete for clients of either variant.
#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn Store>,
}

impl ClientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Persist `client` as given. Uniqueness of email and company identifier
    /// is enforced by storage and surfaces as `ServiceError::Conflict`.
    pub async fn create(&self, client: Client) -> Result<Client, ServiceError> {
        info!("Creating new client with name: {}", client.name);
        Ok(self.store.insert_client(&client).await?)
    }

    pub async fn get_all(&self) -> Result<Vec<Client>, ServiceError> {
        info!("Fetching all clients");
        Ok(self.store.list_clients(None).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Client, ServiceError> {
        info!("Fetching client with ID: {}", id);
        self.store
            .find_client(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Client", id))
    }

    /// Overwrite the mutable fields of client `id` with `new_data`.
    ///
    /// The stored type and the variant field (birth date or company
    /// identifier) are kept; whatever `new_data` carries for them is dropped.
    pub async fn update(&self, id: Uuid, new_data: Client) -> Result<Client, ServiceError> {
        let existing = self.get_by_id(id).await?;
        if new_data.client_type() != existing.client_type() {
            info!(
                "Ignoring type change {} -> {} for client {}",
                existing.client_type(),
                new_data.client_type(),
                id
            );
        }

        let merged = existing.merge_update(new_data);
        info!("Updating client {} ({})", id, existing.name);
        Ok(self.store.update_client(&merged).await?)
    }

    /// Close every active contract of client `id`, detach them, and remove
    /// the client in one storage operation.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let client = self.get_by_id(id).await?;
        self.close_contracts_and_delete(&client).await
    }

    /// Lookup restricted to one variant; a client of the other variant is
    /// reported as not found under `entity`.
    pub(crate) async fn get_of_type(
        &self,
        id: Uuid,
        client_type: ClientType,
        entity: &'static str,
    ) -> Result<Client, ServiceError> {
        match self.store.find_client(id).await? {
            Some(client) if client.client_type() == client_type => Ok(client),
            _ => Err(ServiceError::not_found(entity, id)),
        }
    }

    pub(crate) async fn list_of_type(&self, client_type: ClientType) -> Result<Vec<Client>, ServiceError> {
        Ok(self.store.list_clients(Some(client_type)).await?)
    }

    pub(crate) async fn close_contracts_and_delete(&self, client: &Client) -> Result<(), ServiceError> {
        info!("Deleting client {} ({}) and closing active contracts", client.id, client.name);
        let closed = self
            .store
            .close_contracts_and_delete_client(client.id, models::now())
            .await?
            .ok_or_else(|| ServiceError::not_found("Client", client.id))?;

        info!(
            "Client {} deleted successfully with {} contracts closed",
            client.id, closed
        );
        Ok(())
    }
}
