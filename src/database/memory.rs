use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{ClientStore, ContractStore, Store};
use crate::models::{Client, ClientType, Contract, NewContract};

#[derive(Debug, Default)]
struct Tables {
    clients: Vec<Client>,
    contracts: Vec<Contract>,
    last_contract_id: i64,
}

impl Tables {
    fn check_unique(&self, client: &Client) -> Result<(), DatabaseError> {
        let others = self.clients.iter().filter(|c| c.id != client.id);
        for other in others {
            if other.email == client.email {
                return Err(DatabaseError::Conflict("Email already exists".to_string()));
            }
            if client.company_id().is_some() && other.company_id() == client.company_id() {
                return Err(DatabaseError::Conflict("Company identifier already exists".to_string()));
            }
        }
        Ok(())
    }

    fn contract_mut(&mut self, id: i64) -> Result<&mut Contract, DatabaseError> {
        self.contracts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DatabaseError::Sqlx(sqlx::Error::RowNotFound))
    }
}

/// In-process persistence gateway with the same constraints as the Postgres
/// schema: unique emails, unique company identifiers, insertion order kept,
/// and client deletion nulling the contracts' client reference.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn list_clients(&self, client_type: Option<ClientType>) -> Result<Vec<Client>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .iter()
            .filter(|c| client_type.map_or(true, |t| c.client_type() == t))
            .cloned()
            .collect())
    }

    async fn insert_client(&self, client: &Client) -> Result<Client, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.clients.iter().any(|c| c.id == client.id) {
            return Err(DatabaseError::Conflict(format!("Client {} already exists", client.id)));
        }
        tables.check_unique(client)?;
        tables.clients.push(client.clone());
        Ok(client.clone())
    }

    async fn update_client(&self, client: &Client) -> Result<Client, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_unique(client)?;
        let slot = tables
            .clients
            .iter_mut()
            .find(|c| c.id == client.id)
            .ok_or(DatabaseError::Sqlx(sqlx::Error::RowNotFound))?;
        slot.name = client.name.clone();
        slot.email = client.email.clone();
        slot.phone = client.phone.clone();
        Ok(slot.clone())
    }

    async fn delete_client(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.clients.retain(|c| c.id != id);
        for contract in tables.contracts.iter_mut() {
            if contract.client_id == Some(id) {
                contract.client_id = None;
            }
        }
        Ok(())
    }

    async fn company_id_exists(&self, company_id: &str) -> Result<bool, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.clients.iter().any(|c| c.company_id() == Some(company_id)))
    }

    async fn count_clients(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.read().await.clients.len() as i64)
    }
}

#[async_trait]
impl ContractStore for MemoryStore {
    async fn find_contract(&self, id: i64) -> Result<Option<Contract>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.contracts.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_contract(&self, contract: &NewContract) -> Result<Contract, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(client_id) = contract.client_id {
            if !tables.clients.iter().any(|c| c.id == client_id) {
                return Err(DatabaseError::Conflict(format!("Client {} does not exist", client_id)));
            }
        }
        tables.last_contract_id += 1;
        let stored = Contract {
            id: tables.last_contract_id,
            client_id: contract.client_id,
            start_date: contract.start_date,
            end_date: contract.end_date,
            cost_amount: contract.cost_amount,
            update_date: contract.update_date,
        };
        tables.contracts.push(stored.clone());
        Ok(stored)
    }

    async fn update_contract(&self, contract: &Contract) -> Result<Contract, DatabaseError> {
        let mut tables = self.tables.write().await;
        let slot = tables.contract_mut(contract.id)?;
        *slot = contract.clone();
        Ok(contract.clone())
    }

    async fn save_contracts(&self, contracts: &[Contract]) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        // Validate the whole batch before touching anything
        for contract in contracts {
            tables.contract_mut(contract.id)?;
        }
        for contract in contracts {
            *tables.contract_mut(contract.id)? = contract.clone();
        }
        Ok(())
    }

    async fn find_active_contracts(
        &self,
        client_id: Uuid,
        now: DateTime<Utc>,
        updated_since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Contract>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .contracts
            .iter()
            .filter(|c| c.client_id == Some(client_id) && c.is_active_at(now))
            .filter(|c| updated_since.map_or(true, |since| c.update_date >= since))
            .cloned()
            .collect())
    }

    async fn sum_active_contracts(&self, client_id: Uuid, now: DateTime<Utc>) -> Result<Decimal, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .contracts
            .iter()
            .filter(|c| c.client_id == Some(client_id) && c.is_active_at(now))
            .map(|c| c.cost_amount)
            .sum())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn close_contracts_and_delete_client(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<usize>, DatabaseError> {
        // One write guard for the whole cascade
        let mut tables = self.tables.write().await;
        if !tables.clients.iter().any(|c| c.id == id) {
            return Ok(None);
        }

        let mut closed = 0;
        for contract in tables.contracts.iter_mut().filter(|c| c.client_id == Some(id)) {
            if contract.is_active_at(now) {
                contract.close(now);
                closed += 1;
            } else {
                contract.client_id = None;
            }
        }
        tables.clients.retain(|c| c.id != id);
        Ok(Some(closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now;
    use chrono::Duration;

    #[tokio::test]
    async fn rejects_duplicate_email_and_company_id() {
        let store = MemoryStore::new();
        store
            .insert_client(&Client::company("Acme", "acme@x.com", "+123456", "ABC-123"))
            .await
            .unwrap();

        let same_email = Client::person("Bob", "acme@x.com", "+123456", None);
        assert!(matches!(
            store.insert_client(&same_email).await,
            Err(DatabaseError::Conflict(_))
        ));

        let same_company = Client::company("Other", "other@x.com", "+123456", "ABC-123");
        assert!(matches!(
            store.insert_client(&same_company).await,
            Err(DatabaseError::Conflict(_))
        ));
        assert!(store.company_id_exists("ABC-123").await.unwrap());
        assert!(!store.company_id_exists("XYZ-000").await.unwrap());
    }

    #[tokio::test]
    async fn lists_in_insertion_order_and_filters_by_type() {
        let store = MemoryStore::new();
        let a = Client::person("A", "a@x.com", "+123456", None);
        let b = Client::company("B", "b@x.com", "+123456", "BBB-111");
        let c = Client::person("C", "c@x.com", "+123456", None);
        for client in [&a, &b, &c] {
            store.insert_client(client).await.unwrap();
        }

        let all: Vec<_> = store.list_clients(None).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(all, vec!["A", "B", "C"]);

        let persons = store.list_clients(Some(ClientType::Person)).await.unwrap();
        assert_eq!(persons.len(), 2);
    }

    #[tokio::test]
    async fn sums_only_active_contracts() {
        let store = MemoryStore::new();
        let client = Client::person("A", "a@x.com", "+123456", None);
        store.insert_client(&client).await.unwrap();
        let now = now();

        assert_eq!(store.sum_active_contracts(client.id, now).await.unwrap(), Decimal::ZERO);

        let open = NewContract::for_client(client.id, None, None, Decimal::new(100, 0), now);
        let expired = NewContract::for_client(
            client.id,
            None,
            Some(now - Duration::days(1)),
            Decimal::new(50, 0),
            now,
        );
        store.insert_contract(&open).await.unwrap();
        store.insert_contract(&expired).await.unwrap();

        assert_eq!(store.sum_active_contracts(client.id, now).await.unwrap(), Decimal::new(100, 0));
        assert_eq!(store.find_active_contracts(client.id, now, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_client_detaches_remaining_contracts() {
        let store = MemoryStore::new();
        let client = Client::person("A", "a@x.com", "+123456", None);
        store.insert_client(&client).await.unwrap();
        let now = now();
        let expired = NewContract::for_client(client.id, None, Some(now), Decimal::ONE, now);
        let stored = store.insert_contract(&expired).await.unwrap();

        store.delete_client(client.id).await.unwrap();

        let after = store.find_contract(stored.id).await.unwrap().unwrap();
        assert_eq!(after.client_id, None);
        assert_eq!(after.end_date, stored.end_date);
        assert_eq!(after.update_date, stored.update_date);
    }

    #[tokio::test]
    async fn cascade_closes_only_active_contracts_of_that_client() {
        let store = MemoryStore::new();
        let client = Client::person("A", "a@x.com", "+123456", None);
        let other = Client::person("B", "b@x.com", "+123456", None);
        store.insert_client(&client).await.unwrap();
        store.insert_client(&other).await.unwrap();
        let now = now();
        let open = store
            .insert_contract(&NewContract::for_client(client.id, None, None, Decimal::ONE, now))
            .await
            .unwrap();
        let expired = store
            .insert_contract(&NewContract::for_client(
                client.id,
                None,
                Some(now - Duration::days(1)),
                Decimal::ONE,
                now,
            ))
            .await
            .unwrap();
        let foreign = store
            .insert_contract(&NewContract::for_client(other.id, None, None, Decimal::ONE, now))
            .await
            .unwrap();

        let at = now + Duration::seconds(5);
        assert_eq!(store.close_contracts_and_delete_client(client.id, at).await.unwrap(), Some(1));

        let closed = store.find_contract(open.id).await.unwrap().unwrap();
        assert_eq!((closed.end_date, closed.client_id, closed.update_date), (Some(at), None, at));
        let detached = store.find_contract(expired.id).await.unwrap().unwrap();
        assert_eq!(detached.client_id, None);
        assert_eq!(detached.end_date, expired.end_date);
        assert_eq!(detached.update_date, expired.update_date);
        assert_eq!(store.find_contract(foreign.id).await.unwrap().unwrap(), foreign);
        assert_eq!(store.count_clients().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cascade_on_missing_client_changes_nothing() {
        let store = MemoryStore::new();
        assert_eq!(
            store.close_contracts_and_delete_client(Uuid::new_v4(), now()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn save_contracts_is_all_or_nothing() {
        let store = MemoryStore::new();
        let client = Client::person("A", "a@x.com", "+123456", None);
        store.insert_client(&client).await.unwrap();
        let now = now();
        let mut stored = store
            .insert_contract(&NewContract::for_client(client.id, None, None, Decimal::ONE, now))
            .await
            .unwrap();
        stored.cost_amount = Decimal::TEN;
        let mut ghost = stored.clone();
        ghost.id = 999;

        assert!(store.save_contracts(&[stored.clone(), ghost]).await.is_err());
        let unchanged = store.find_contract(stored.id).await.unwrap().unwrap();
        assert_eq!(unchanged.cost_amount, Decimal::ONE);
    }
}
