use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::models::{Client, ClientType, Contract, NewContract};

/// Client half of the persistence gateway.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, DatabaseError>;

    /// All clients in storage order, optionally restricted to one variant.
    async fn list_clients(&self, client_type: Option<ClientType>) -> Result<Vec<Client>, DatabaseError>;

    /// Fails with `Conflict` on a duplicate email or company identifier.
    async fn insert_client(&self, client: &Client) -> Result<Client, DatabaseError>;

    async fn update_client(&self, client: &Client) -> Result<Client, DatabaseError>;

    /// Removing a client leaves its contracts in place with no client reference.
    async fn delete_client(&self, id: Uuid) -> Result<(), DatabaseError>;

    async fn company_id_exists(&self, company_id: &str) -> Result<bool, DatabaseError>;

    async fn count_clients(&self) -> Result<i64, DatabaseError>;
}

/// Contract half of the persistence gateway.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn find_contract(&self, id: i64) -> Result<Option<Contract>, DatabaseError>;

    async fn insert_contract(&self, contract: &NewContract) -> Result<Contract, DatabaseError>;

    async fn update_contract(&self, contract: &Contract) -> Result<Contract, DatabaseError>;

    /// Persist every contract or none of them.
    async fn save_contracts(&self, contracts: &[Contract]) -> Result<(), DatabaseError>;

    /// Contracts of `client_id` with no end date or an end date after `now`,
    /// and, when `updated_since` is given, an update date at or after it.
    async fn find_active_contracts(
        &self,
        client_id: Uuid,
        now: DateTime<Utc>,
        updated_since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Contract>, DatabaseError>;

    /// Sum of cost amounts over the active contracts of `client_id`; zero when none.
    async fn sum_active_contracts(&self, client_id: Uuid, now: DateTime<Utc>) -> Result<Decimal, DatabaseError>;
}

#[async_trait]
pub trait Store: ClientStore + ContractStore {
    /// Cheap round trip used by health checks and the schema wait loop.
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Close every contract of client `id` that is active at `now` (end date
    /// set to `now`, client reference cleared, update date advanced), then
    /// delete the client. All of it happens or none of it does, and no
    /// contract can be attached to the client in between.
    ///
    /// Returns the number of contracts closed, or `None` when there is no
    /// such client.
    async fn close_contracts_and_delete_client(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<usize>, DatabaseError>;
}
