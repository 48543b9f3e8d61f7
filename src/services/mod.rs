pub mod client_service;
pub mod company_service;
pub mod contract_service;
pub mod error;
pub mod person_service;

pub use client_service::ClientService;
pub use company_service::CompanyService;
pub use contract_service::ContractService;
pub use error::ServiceError;
pub use person_service::PersonService;
