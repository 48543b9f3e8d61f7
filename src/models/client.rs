use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Discriminant of a client record. Fixed when the client is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    Person,
    Company,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Person => "PERSON",
            ClientType::Company => "COMPANY",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("PERSON") {
            Ok(ClientType::Person)
        } else if s.eq_ignore_ascii_case("COMPANY") {
            Ok(ClientType::Company)
        } else {
            Err(format!("Invalid client type: {}", s))
        }
    }
}

/// Variant-specific data. Both fields are write-once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientKind {
    Person { birth_date: Option<NaiveDate> },
    Company { company_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub kind: ClientKind,
}

impl Client {
    pub fn person(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        birth_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            kind: ClientKind::Person { birth_date },
        }
    }

    pub fn company(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        company_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            kind: ClientKind::Company {
                company_id: company_id.into(),
            },
        }
    }

    pub fn client_type(&self) -> ClientType {
        match self.kind {
            ClientKind::Person { .. } => ClientType::Person,
            ClientKind::Company { .. } => ClientType::Company,
        }
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        match &self.kind {
            ClientKind::Person { birth_date } => *birth_date,
            ClientKind::Company { .. } => None,
        }
    }

    pub fn company_id(&self) -> Option<&str> {
        match &self.kind {
            ClientKind::Company { company_id } => Some(company_id),
            ClientKind::Person { .. } => None,
        }
    }

    /// Apply an update payload to this record.
    ///
    /// Only `name`, `email` and `phone` are taken from `incoming`. The id, the
    /// client type and the variant fields (birth date, company identifier)
    /// always come from `self`, whatever the payload carried.
    pub fn merge_update(&self, incoming: Client) -> Client {
        Client {
            id: self.id,
            name: incoming.name,
            email: incoming.email,
            phone: incoming.phone,
            kind: self.kind.clone(),
        }
    }
}
