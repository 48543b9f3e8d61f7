use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{ClientStore, ContractStore, Store};
use crate::models::{Client, ClientKind, ClientType, Contract, NewContract};

const CLIENT_COLUMNS: &str = "id, name, email, phone, client_type, birth_date, company_id";
const CONTRACT_COLUMNS: &str = "id, client_id, start_date, end_date, cost_amount, update_date";

#[derive(Debug, FromRow)]
struct ClientRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    client_type: String,
    birth_date: Option<NaiveDate>,
    company_id: Option<String>,
}

impl TryFrom<ClientRow> for Client {
    type Error = DatabaseError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let client_type: ClientType = row.client_type.parse().map_err(DatabaseError::InvalidRow)?;
        let kind = match client_type {
            ClientType::Person => ClientKind::Person {
                birth_date: row.birth_date,
            },
            ClientType::Company => ClientKind::Company {
                company_id: row.company_id.ok_or_else(|| {
                    DatabaseError::InvalidRow(format!("company {} has no company_id", row.id))
                })?,
            },
        };
        Ok(Client {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            kind,
        })
    }
}

#[derive(Debug, FromRow)]
struct ContractRow {
    id: i64,
    client_id: Option<Uuid>,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    cost_amount: Decimal,
    update_date: DateTime<Utc>,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Contract {
            id: row.id,
            client_id: row.client_id,
            start_date: row.start_date,
            end_date: row.end_date,
            cost_amount: row.cost_amount,
            update_date: row.update_date,
        }
    }
}

/// Postgres-backed persistence gateway
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, DatabaseError> {
        let sql = format!("SELECT {} FROM clients WHERE id = $1", CLIENT_COLUMNS);
        sqlx::query_as::<_, ClientRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Client::try_from)
            .transpose()
    }

    async fn list_clients(&self, client_type: Option<ClientType>) -> Result<Vec<Client>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM clients WHERE ($1::TEXT IS NULL OR client_type = $1) ORDER BY created_at, id",
            CLIENT_COLUMNS
        );
        sqlx::query_as::<_, ClientRow>(&sql)
            .bind(client_type.map(|t| t.as_str()))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Client::try_from)
            .collect()
    }

    async fn insert_client(&self, client: &Client) -> Result<Client, DatabaseError> {
        sqlx::query(
            "INSERT INTO clients (id, name, email, phone, client_type, birth_date, company_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.client_type().as_str())
        .bind(client.birth_date())
        .bind(client.company_id())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(client.clone())
    }

    async fn update_client(&self, client: &Client) -> Result<Client, DatabaseError> {
        // client_type, birth_date and company_id are never rewritten
        let result = sqlx::query("UPDATE clients SET name = $2, email = $3, phone = $4 WHERE id = $1")
            .bind(client.id)
            .bind(&client.name)
            .bind(&client.email)
            .bind(&client.phone)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::Sqlx(sqlx::Error::RowNotFound));
        }
        Ok(client.clone())
    }

    async fn delete_client(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn company_id_exists(&self, company_id: &str) -> Result<bool, DatabaseError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM clients WHERE company_id = $1)")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn count_clients(&self) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

#[async_trait]
impl ContractStore for PgStore {
    async fn find_contract(&self, id: i64) -> Result<Option<Contract>, DatabaseError> {
        let sql = format!("SELECT {} FROM contracts WHERE id = $1", CONTRACT_COLUMNS);
        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Contract::from))
    }

    async fn insert_contract(&self, contract: &NewContract) -> Result<Contract, DatabaseError> {
        let sql = format!(
            "INSERT INTO contracts (client_id, start_date, end_date, cost_amount, update_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            CONTRACT_COLUMNS
        );
        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(contract.client_id)
            .bind(contract.start_date)
            .bind(contract.end_date)
            .bind(contract.cost_amount)
            .bind(contract.update_date)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(row.into())
    }

    async fn update_contract(&self, contract: &Contract) -> Result<Contract, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let saved = write_contract(&mut tx, contract).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn save_contracts(&self, contracts: &[Contract]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for contract in contracts {
            write_contract(&mut tx, contract).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_active_contracts(
        &self,
        client_id: Uuid,
        now: DateTime<Utc>,
        updated_since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Contract>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM contracts
             WHERE client_id = $1
               AND (end_date IS NULL OR end_date > $2)
               AND ($3::TIMESTAMPTZ IS NULL OR update_date >= $3)
             ORDER BY id",
            CONTRACT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(client_id)
            .bind(now)
            .bind(updated_since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Contract::from).collect())
    }

    async fn sum_active_contracts(&self, client_id: Uuid, now: DateTime<Utc>) -> Result<Decimal, DatabaseError> {
        let total: (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(cost_amount), 0) FROM contracts
             WHERE client_id = $1 AND (end_date IS NULL OR end_date > $2)",
        )
        .bind(client_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1 FROM clients LIMIT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close_contracts_and_delete_client(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<usize>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Blocks contract inserts for this client (their foreign key check
        // needs a share lock on the row) until the transaction ends
        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM clients WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let closed = sqlx::query(
            "UPDATE contracts
             SET end_date = $2,
                 client_id = NULL,
                 update_date = GREATEST($2, update_date + INTERVAL '1 microsecond')
             WHERE client_id = $1 AND (end_date IS NULL OR end_date > $2)",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .rows_affected();

        sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        tx.commit().await?;
        Ok(Some(closed as usize))
    }
}

async fn write_contract(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    contract: &Contract,
) -> Result<Contract, DatabaseError> {
    let sql = format!(
        "UPDATE contracts
         SET client_id = $2, start_date = $3, end_date = $4, cost_amount = $5, update_date = $6
         WHERE id = $1
         RETURNING {}",
        CONTRACT_COLUMNS
    );
    let row = sqlx::query_as::<_, ContractRow>(&sql)
        .bind(contract.id)
        .bind(contract.client_id)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.cost_amount)
        .bind(contract.update_date)
        .fetch_one(&mut **tx)
        .await
        .map_err(DatabaseError::from_sqlx)?;
    Ok(row.into())
}
