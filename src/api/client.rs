use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{field_errors_of, finish, reject, FieldErrors};
use crate::error::ApiError;
use crate::models::{Client, ClientKind, ClientType};

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{6,15}$").expect("phone pattern compiles"));
static COMPANY_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3}-\d{3}$").expect("company id pattern compiles"));

const COMPANY_ID_FORMAT: &str = "Invalid company identifier format. Expected pattern: aaa-123";

/// Body of `POST /api/clients` and `PUT /api/clients/:id`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email must be valid")
    )]
    pub email: String,

    #[validate(regex(path = *PHONE_PATTERN, message = "Phone number must be valid"))]
    pub phone: String,

    #[serde(rename = "type")]
    pub client_type: String,

    // For PERSON
    pub birth_date: Option<NaiveDate>,

    // For COMPANY
    pub company_id: Option<String>,
}

impl ClientRequest {
    /// Checks for `POST`: a company must bring a well-formed identifier.
    pub fn validated_for_create(self) -> Result<Client, ApiError> {
        self.validated(true)
    }

    /// Checks for `PUT`: the identifier is immutable, so it is not required.
    pub fn validated_for_update(self) -> Result<Client, ApiError> {
        self.validated(false)
    }

    fn validated(self, require_company_id: bool) -> Result<Client, ApiError> {
        let mut fields = field_errors_of(self.validate());
        check_contact(&self.name, &mut fields);
        check_birth_date(self.birth_date, &mut fields);

        let client_type = match self.client_type.parse::<ClientType>() {
            Ok(client_type) => Some(client_type),
            Err(_) => {
                reject("type", "Type must be PERSON or COMPANY", &mut fields);
                None
            }
        };
        if require_company_id && client_type == Some(ClientType::Company) {
            check_company_id(self.company_id.as_deref(), &mut fields);
        }
        finish(fields)?;

        let client_type =
            client_type.ok_or_else(|| ApiError::bad_request("Type must be PERSON or COMPANY"))?;
        let kind = match client_type {
            ClientType::Person => ClientKind::Person {
                birth_date: self.birth_date,
            },
            ClientType::Company => ClientKind::Company {
                company_id: self.company_id.map(|id| id.trim().to_string()).unwrap_or_default(),
            },
        };
        Ok(Client {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            kind,
        })
    }
}

/// Body of `POST /api/persons`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email must be valid")
    )]
    pub email: String,

    #[validate(regex(path = *PHONE_PATTERN, message = "Phone number must be valid"))]
    pub phone: String,

    pub birth_date: Option<NaiveDate>,
}

impl PersonRequest {
    pub fn validated(self) -> Result<Client, ApiError> {
        let mut fields = field_errors_of(self.validate());
        check_contact(&self.name, &mut fields);
        check_birth_date(self.birth_date, &mut fields);
        finish(fields)?;
        Ok(Client::person(self.name, self.email, self.phone, self.birth_date))
    }
}

/// Body of `POST /api/companies`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email must be valid")
    )]
    pub email: String,

    #[validate(regex(path = *PHONE_PATTERN, message = "Phone number must be valid"))]
    pub phone: String,

    pub company_id: Option<String>,
}

impl CompanyRequest {
    pub fn validated(self) -> Result<Client, ApiError> {
        let mut fields = field_errors_of(self.validate());
        check_contact(&self.name, &mut fields);
        check_company_id(self.company_id.as_deref(), &mut fields);
        finish(fields)?;
        Ok(Client::company(
            self.name,
            self.email,
            self.phone,
            self.company_id.map(|id| id.trim().to_string()).unwrap_or_default(),
        ))
    }
}

fn check_contact(name: &str, fields: &mut FieldErrors) {
    if name.trim().is_empty() {
        reject("name", "Name is required", fields);
    }
}

fn check_birth_date(birth_date: Option<NaiveDate>, fields: &mut FieldErrors) {
    if let Some(birth_date) = birth_date {
        if birth_date >= Utc::now().date_naive() {
            reject("birthDate", "Birth date must be in the past", fields);
        }
    }
}

fn check_company_id(company_id: Option<&str>, fields: &mut FieldErrors) {
    match company_id.map(str::trim) {
        None | Some("") => reject("companyId", "Company identifier is required", fields),
        Some(id) if !COMPANY_ID_PATTERN.is_match(id) => reject("companyId", COMPANY_ID_FORMAT, fields),
        Some(_) => {}
    }
}

/// Client as returned by every client, person and company endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        let client_type = client.client_type();
        let (birth_date, company_id) = match client.kind {
            ClientKind::Person { birth_date } => (birth_date, None),
            ClientKind::Company { company_id } => (None, Some(company_id)),
        };
        Self {
            id: client.id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            client_type,
            birth_date,
            company_id,
        }
    }
}
