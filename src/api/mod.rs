//! Request and response bodies exchanged at the HTTP boundary.
//!
//! Requests are checked here, before any service is called; responses are
//! the only shapes that leave the process.

pub mod auth;
pub mod client;
pub mod contract;

pub use auth::{LoginRequest, LoginResponse};
pub use client::{ClientRequest, ClientResponse, CompanyRequest, PersonRequest};
pub use contract::{parse_timestamp, ActiveContractsQuery, ContractRequest, ContractResponse, CostUpdateQuery, ValidContract};

use std::collections::HashMap;
use validator::ValidationErrors;

use crate::error::ApiError;

/// Per-field messages, first message wins.
pub type FieldErrors = HashMap<String, String>;

pub(crate) fn collect_field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "Invalid value".to_string());
            (field.to_string(), message)
        })
        .collect()
}

/// Start from the derive-level errors, then let hand-written checks add to them.
pub(crate) fn field_errors_of(result: Result<(), ValidationErrors>) -> FieldErrors {
    match result {
        Ok(()) => FieldErrors::new(),
        Err(errors) => collect_field_errors(&errors),
    }
}

pub(crate) fn reject(field: &str, message: &str, fields: &mut FieldErrors) {
    fields
        .entry(field.to_string())
        .or_insert_with(|| message.to_string());
}

pub(crate) fn finish(fields: FieldErrors) -> Result<(), ApiError> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Validation failed", Some(fields)))
    }
}
