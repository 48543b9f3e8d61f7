use tracing::info;
use uuid::Uuid;

use crate::database::Store;
use crate::models::{Client, ClientType};
use crate::services::{ClientService, ServiceError};
use std::sync::Arc;

/// Company-only view over the client records.
#[derive(Clone)]
pub struct CompanyService {
    store: Arc<dyn Store>,
    clients: ClientService,
}

impl CompanyService {
    pub fn new(store: Arc<dyn Store>, clients: ClientService) -> Self {
        Self { store, clients }
    }

    /// Checks the company identifier is free before inserting.
    pub async fn create(&self, company: Client) -> Result<Client, ServiceError> {
        let company_id = company
            .company_id()
            .ok_or_else(|| ServiceError::Validation("Client type must be COMPANY".to_string()))?;
        if self.store.company_id_exists(company_id).await? {
            return Err(ServiceError::Conflict(format!(
                "Company identifier already exists: {}",
                company_id
            )));
        }
        info!("Creating company client: {}", company.name);
        self.clients.create(company).await
    }

    pub async fn get_all(&self) -> Result<Vec<Client>, ServiceError> {
        info!("Fetching all companies");
        self.clients.list_of_type(ClientType::Company).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Client, ServiceError> {
        info!("Fetching company with ID: {}", id);
        self.clients.get_of_type(id, ClientType::Company, "Company").await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        info!("Deleting company with ID: {}", id);
        let company = self.get_by_id(id).await?;
        self.clients.close_contracts_and_delete(&company).await
    }
}
