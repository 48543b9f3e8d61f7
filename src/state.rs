use std::sync::Arc;

use crate::auth::{Authenticator, JwtService};
use crate::database::Store;
use crate::services::{ClientService, CompanyService, ContractService, PersonService};

/// Everything a handler needs, cloned into each request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clients: ClientService,
    pub persons: PersonService,
    pub companies: CompanyService,
    pub contracts: ContractService,
    pub jwt: Arc<JwtService>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt: JwtService, authenticator: Arc<dyn Authenticator>) -> Self {
        let clients = ClientService::new(store.clone());
        Self {
            persons: PersonService::new(clients.clone()),
            companies: CompanyService::new(store.clone(), clients.clone()),
            contracts: ContractService::new(store.clone()),
            clients,
            store,
            jwt: Arc::new(jwt),
            authenticator,
        }
    }
}
