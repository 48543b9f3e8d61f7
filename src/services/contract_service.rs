use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::database::Store;
use crate::models::{self, Contract, NewContract};
use crate::services::ServiceError;

/// Contract creation, cost updates and active-contract queries.
///
/// Every write stamps `update_date`; cost amounts are assumed to have been
/// checked for positivity at the request boundary.
#[derive(Clone)]
pub struct ContractService {
    store: Arc<dyn Store>,
}

impl ContractService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Persist a fully formed contract. Only the update date is restamped.
    pub async fn create(&self, mut contract: NewContract) -> Result<Contract, ServiceError> {
        contract.on_create(models::now());
        match contract.client_id {
            Some(client_id) => info!("Creating contract for client {}", client_id),
            None => info!("Creating contract without client"),
        }
        Ok(self.store.insert_contract(&contract).await?)
    }

    /// Create a contract for `client_id`; a missing start date becomes now.
    pub async fn create_for_client(
        &self,
        client_id: Uuid,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        cost_amount: Decimal,
    ) -> Result<Contract, ServiceError> {
        if self.store.find_client(client_id).await?.is_none() {
            return Err(ServiceError::not_found("Client", client_id));
        }

        let contract = NewContract::for_client(client_id, start_date, end_date, cost_amount, models::now());
        info!(
            "Creating contract for client {} (start={}, end={:?}, amount={})",
            client_id, contract.start_date, contract.end_date, cost_amount
        );
        Ok(self.store.insert_contract(&contract).await?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Contract, ServiceError> {
        self.store
            .find_contract(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contract", id))
    }

    pub async fn update_cost_amount(&self, id: i64, new_amount: Decimal) -> Result<Contract, ServiceError> {
        let mut contract = self.get_by_id(id).await?;
        contract.set_cost_amount(new_amount, models::now());
        info!("Updated contract {} with new cost amount {}", id, new_amount);
        Ok(self.store.update_contract(&contract).await?)
    }

    /// Active contracts of a client, optionally only those updated at or
    /// after `updated_since`. Storage order.
    pub async fn get_active_contracts(
        &self,
        client_id: Uuid,
        updated_since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Contract>, ServiceError> {
        match updated_since {
            Some(since) => info!("Fetching active contracts for client {} updated since {}", client_id, since),
            None => info!("Fetching all active contracts for client {}", client_id),
        }
        Ok(self
            .store
            .find_active_contracts(client_id, models::now(), updated_since)
            .await?)
    }

    /// Zero when the client has no active contract.
    pub async fn get_total_active_contract_amount(&self, client_id: Uuid) -> Result<Decimal, ServiceError> {
        info!("Calculating total active contract cost for client {}", client_id);
        Ok(self.store.sum_active_contracts(client_id, models::now()).await?)
    }
}
