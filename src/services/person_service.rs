use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::{Client, ClientType};
use crate::services::{ClientService, ServiceError};

/// Person-only view over the client records.
#[derive(Clone)]
pub struct PersonService {
    clients: ClientService,
}

impl PersonService {
    pub fn new(clients: ClientService) -> Self {
        Self { clients }
    }

    /// Rejects a birth date that is not strictly before today (UTC).
    pub async fn create(&self, person: Client) -> Result<Client, ServiceError> {
        if person.client_type() != ClientType::Person {
            return Err(ServiceError::Validation("Client type must be PERSON".to_string()));
        }
        if let Some(birth_date) = person.birth_date() {
            if birth_date >= Utc::now().date_naive() {
                return Err(ServiceError::Validation("Birth date must be in the past".to_string()));
            }
        }
        info!("Creating person client: {}", person.name);
        self.clients.create(person).await
    }

    pub async fn get_all(&self) -> Result<Vec<Client>, ServiceError> {
        info!("Fetching all persons");
        self.clients.list_of_type(ClientType::Person).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Client, ServiceError> {
        info!("Fetching person with ID: {}", id);
        self.clients.get_of_type(id, ClientType::Person, "Person").await
    }

    /// Same cascade as deleting through the client service.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        info!("Deleting person with ID: {}", id);
        let person = self.get_by_id(id).await?;
        self.clients.close_contracts_and_delete(&person).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;

    fn service() -> PersonService {
        PersonService::new(ClientService::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn rejects_future_birth_date() {
        let service = service();
        let tomorrow = Utc::now().date_naive() + Duration::days(1);
        let err = service
            .create(Client::person("A", "a@x.com", "+123456", Some(tomorrow)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_birth_date_of_today() {
        let service = service();
        let today = Utc::now().date_naive();
        let err = service
            .create(Client::person("A", "a@x.com", "+123456", Some(today)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref msg) if msg == "Birth date must be in the past"));
        assert!(service.get_all().await.unwrap().is_empty());

        let yesterday = today - Duration::days(1);
        assert!(service
            .create(Client::person("A", "a@x.com", "+123456", Some(yesterday)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn company_id_is_not_a_person() {
        let service = service();
        let company = service
            .clients
            .create(Client::company("Acme", "acme@x.com", "+123456", "ABC-123"))
            .await
            .unwrap();

        let err = service.get_by_id(company.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Person", .. }));
        assert!(service.delete(company.id).await.is_err());
        assert!(service.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn creates_lists_and_deletes_person() {
        let service = service();
        let person = service
            .create(Client::person("A", "a@x.com", "+123456", NaiveDate::from_ymd_opt(1990, 1, 1)))
            .await
            .unwrap();

        assert_eq!(service.get_all().await.unwrap(), vec![person.clone()]);
        service.delete(person.id).await.unwrap();
        assert!(service.get_all().await.unwrap().is_empty());
    }
}
