//! Startup initializer: wait for the schema, then load the fixture into an
//! empty store.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{DatabaseConfig, SeedConfig};
use crate::database::{DatabaseError, Store};
use crate::models::{self, Client, ClientType, NewContract};

/// Upper bound for a single wait between schema probes
const MAX_SCHEMA_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFixture {
    #[serde(default)]
    pub clients: Vec<SeedClient>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedClient {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    pub birth_date: Option<NaiveDate>,
    pub company_id: Option<String>,
    #[serde(default)]
    pub contracts: Vec<SeedContract>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedContract {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cost_amount: Decimal,
}

impl SeedFixture {
    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let fixture: SeedFixture = serde_yaml::from_str(raw).context("Failed to parse seed fixture")?;
        for client in &fixture.clients {
            if client.client_type == ClientType::Company && client.company_id.is_none() {
                anyhow::bail!("Seed company {} has no companyId", client.name);
            }
        }
        Ok(fixture)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed fixture {}", path.display()))?;
        Self::from_yaml(&raw)
    }
}

impl SeedClient {
    fn to_client(&self) -> Client {
        match self.client_type {
            ClientType::Person => Client::person(&self.name, &self.email, &self.phone, self.birth_date),
            ClientType::Company => Client::company(
                &self.name,
                &self.email,
                &self.phone,
                self.company_id.clone().unwrap_or_default(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Disabled,
    AlreadyPopulated(i64),
    /// Counting failed; nothing was written.
    CountUnavailable,
    Seeded { clients: usize, contracts: usize },
}

/// Probe the store until it answers, sleeping a little longer after each miss.
pub async fn wait_for_schema(store: &dyn Store, database: &DatabaseConfig) -> Result<(), DatabaseError> {
    let attempts = database.schema_wait_attempts.max(1);
    let base = Duration::from_millis(database.schema_wait_delay_ms);

    for attempt in 1..=attempts {
        match store.ping().await {
            Ok(()) => {
                if attempt > 1 {
                    info!("Schema ready after {} attempts", attempt);
                }
                return Ok(());
            }
            Err(e) if attempt < attempts => {
                let delay = (base * attempt).min(MAX_SCHEMA_WAIT);
                warn!(
                    "Schema not ready (attempt {}/{}): {}; retrying in {:?}",
                    attempt, attempts, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => warn!("Schema not ready (attempt {}/{}): {}", attempt, attempts, e),
        }
    }

    Err(DatabaseError::SchemaNotReady(attempts))
}

/// Load the configured fixture when seeding is enabled and the store is empty.
pub async fn initialize(store: &dyn Store, seed: &SeedConfig) -> anyhow::Result<SeedOutcome> {
    if !seed.enabled {
        info!("Seeding disabled");
        return Ok(SeedOutcome::Disabled);
    }

    match existing_clients(store).await {
        Some(0) => {}
        Some(count) => {
            info!("Existing data found ({} clients), skipping seed", count);
            return Ok(SeedOutcome::AlreadyPopulated(count));
        }
        None => return Ok(SeedOutcome::CountUnavailable),
    }

    let fixture = SeedFixture::from_path(&seed.fixture_path)?;
    seed_store(store, &fixture).await
}

/// Insert every client of `fixture` and its contracts, if the store is empty.
pub async fn seed_store(store: &dyn Store, fixture: &SeedFixture) -> anyhow::Result<SeedOutcome> {
    match existing_clients(store).await {
        Some(0) => {}
        Some(count) => return Ok(SeedOutcome::AlreadyPopulated(count)),
        None => return Ok(SeedOutcome::CountUnavailable),
    }

    info!("No data found, seeding {} clients", fixture.clients.len());
    let now = models::now();
    let mut contracts = 0;
    for seed_client in &fixture.clients {
        let client = store
            .insert_client(&seed_client.to_client())
            .await
            .with_context(|| format!("Failed to seed client {}", seed_client.email))?;

        for seed_contract in &seed_client.contracts {
            let contract = NewContract::for_client(
                client.id,
                seed_contract.start_date,
                seed_contract.end_date,
                seed_contract.cost_amount,
                now,
            );
            store
                .insert_contract(&contract)
                .await
                .with_context(|| format!("Failed to seed contract for {}", seed_client.email))?;
            contracts += 1;
        }
    }

    info!("Seeded {} clients and {} contracts", fixture.clients.len(), contracts);
    Ok(SeedOutcome::Seeded {
        clients: fixture.clients.len(),
        contracts,
    })
}

async fn existing_clients(store: &dyn Store) -> Option<i64> {
    match store.count_clients().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Could not count clients, skipping seed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ClientStore, ContractStore, MemoryStore};
    use async_trait::async_trait;
    use uuid::Uuid;

    const FIXTURE: &str = r#"
clients:
  - name: Alice Martin
    email: alice@example.com
    phone: "+41791234567"
    type: PERSON
    birthDate: 1985-04-12
    contracts:
      - costAmount: "1200.50"
        startDate: 2024-01-01T00:00:00Z
      - costAmount: "80"
        startDate: 2023-01-01T00:00:00Z
        endDate: 2023-12-31T00:00:00Z
  - name: Acme SA
    email: contact@acme.example
    phone: "0215550101"
    type: COMPANY
    companyId: acm-001
"#;

    fn seed_config(enabled: bool) -> SeedConfig {
        SeedConfig {
            enabled,
            fixture_path: "does-not-exist.yaml".to_string(),
        }
    }

    #[test]
    fn parses_fixture() {
        let fixture = SeedFixture::from_yaml(FIXTURE).unwrap();
        assert_eq!(fixture.clients.len(), 2);
        assert_eq!(fixture.clients[0].contracts.len(), 2);
        assert_eq!(fixture.clients[1].company_id.as_deref(), Some("acm-001"));
    }

    #[test]
    fn rejects_company_without_identifier() {
        let raw = "clients:\n  - {name: X, email: x@x.com, phone: '123456', type: COMPANY}\n";
        assert!(SeedFixture::from_yaml(raw).is_err());
    }

    #[test]
    fn bundled_fixture_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/seed.yaml");
        let fixture = SeedFixture::from_path(path).unwrap();
        assert!(!fixture.clients.is_empty());
    }

    #[tokio::test]
    async fn seeds_empty_store_once() {
        let store = MemoryStore::new();
        let fixture = SeedFixture::from_yaml(FIXTURE).unwrap();

        let first = seed_store(&store, &fixture).await.unwrap();
        assert_eq!(first, SeedOutcome::Seeded { clients: 2, contracts: 2 });

        let second = seed_store(&store, &fixture).await.unwrap();
        assert_eq!(second, SeedOutcome::AlreadyPopulated(2));
    }

    #[tokio::test]
    async fn disabled_seed_does_not_touch_store() {
        let store = MemoryStore::new();
        let outcome = initialize(&store, &seed_config(false)).await.unwrap();
        assert_eq!(outcome, SeedOutcome::Disabled);
        assert_eq!(store.count_clients().await.unwrap(), 0);
    }

    /// Store whose every call fails, standing in for a database that is down.
    struct Unreachable;

    fn down() -> DatabaseError {
        DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
    }

    #[async_trait]
    impl ClientStore for Unreachable {
        async fn find_client(&self, _: Uuid) -> Result<Option<Client>, DatabaseError> {
            Err(down())
        }
        async fn list_clients(&self, _: Option<ClientType>) -> Result<Vec<Client>, DatabaseError> {
            Err(down())
        }
        async fn insert_client(&self, _: &Client) -> Result<Client, DatabaseError> {
            Err(down())
        }
        async fn update_client(&self, _: &Client) -> Result<Client, DatabaseError> {
            Err(down())
        }
        async fn delete_client(&self, _: Uuid) -> Result<(), DatabaseError> {
            Err(down())
        }
        async fn company_id_exists(&self, _: &str) -> Result<bool, DatabaseError> {
            Err(down())
        }
        async fn count_clients(&self) -> Result<i64, DatabaseError> {
            Err(down())
        }
    }

    #[async_trait]
    impl ContractStore for Unreachable {
        async fn find_contract(&self, _: i64) -> Result<Option<crate::models::Contract>, DatabaseError> {
            Err(down())
        }
        async fn insert_contract(&self, _: &NewContract) -> Result<crate::models::Contract, DatabaseError> {
            Err(down())
        }
        async fn update_contract(&self, _: &crate::models::Contract) -> Result<crate::models::Contract, DatabaseError> {
            Err(down())
        }
        async fn save_contracts(&self, _: &[crate::models::Contract]) -> Result<(), DatabaseError> {
            Err(down())
        }
        async fn find_active_contracts(
            &self,
            _: Uuid,
            _: DateTime<Utc>,
            _: Option<DateTime<Utc>>,
        ) -> Result<Vec<crate::models::Contract>, DatabaseError> {
            Err(down())
        }
        async fn sum_active_contracts(&self, _: Uuid, _: DateTime<Utc>) -> Result<Decimal, DatabaseError> {
            Err(down())
        }
    }

    #[async_trait]
    impl Store for Unreachable {
        async fn ping(&self) -> Result<(), DatabaseError> {
            Err(down())
        }
        async fn close_contracts_and_delete_client(
            &self,
            _: Uuid,
            _: DateTime<Utc>,
        ) -> Result<Option<usize>, DatabaseError> {
            Err(down())
        }
    }

    #[tokio::test]
    async fn count_failure_skips_seed() {
        let outcome = initialize(&Unreachable, &seed_config(true)).await.unwrap();
        assert_eq!(outcome, SeedOutcome::CountUnavailable);
    }

    #[tokio::test]
    async fn schema_wait_gives_up_after_bounded_attempts() {
        let database = DatabaseConfig {
            url: None,
            max_connections: 1,
            connect_timeout_secs: 1,
            schema_wait_attempts: 3,
            schema_wait_delay_ms: 1,
        };
        let err = wait_for_schema(&Unreachable, &database).await.unwrap_err();
        assert!(matches!(err, DatabaseError::SchemaNotReady(3)));

        assert!(wait_for_schema(&MemoryStore::new(), &database).await.is_ok());
    }
}
