use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{finish, reject, FieldErrors};
use crate::error::ApiError;
use crate::models::Contract;

/// Body of `POST /api/contracts`
///
/// Dates are accepted as RFC 3339 timestamps, zone-less `YYYY-MM-DDTHH:MM:SS`
/// (read as UTC) or plain dates (start of day UTC).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractRequest {
    pub client_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cost_amount: Option<Decimal>,
}

/// A contract request that passed the boundary checks
#[derive(Debug, Clone, PartialEq)]
pub struct ValidContract {
    pub client_id: Uuid,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cost_amount: Decimal,
}

impl ContractRequest {
    pub fn validated(self, now: DateTime<Utc>) -> Result<ValidContract, ApiError> {
        let mut fields = FieldErrors::new();

        let client_id = match self.client_id.as_deref().map(str::trim) {
            None | Some("") => {
                reject("clientId", "Client id is required", &mut fields);
                None
            }
            Some(raw) => {
                let parsed = Uuid::parse_str(raw).ok();
                if parsed.is_none() {
                    reject("clientId", "Client id must be a UUID", &mut fields);
                }
                parsed
            }
        };

        let start_date = timestamp_field("startDate", self.start_date.as_deref(), &mut fields);
        if matches!(start_date, Some(start) if start > now) {
            reject("startDate", "Start date cannot be in the future", &mut fields);
        }
        let end_date = timestamp_field("endDate", self.end_date.as_deref(), &mut fields);

        match self.cost_amount {
            None => reject("costAmount", "Cost amount is required", &mut fields),
            Some(amount) => {
                if let Some(problem) = amount_problem("Cost amount", amount) {
                    reject("costAmount", &problem, &mut fields);
                }
            }
        }

        finish(fields)?;
        match (client_id, self.cost_amount) {
            (Some(client_id), Some(cost_amount)) => Ok(ValidContract {
                client_id,
                start_date,
                end_date,
                cost_amount: cost_amount.round_dp(2),
            }),
            _ => Err(ApiError::bad_request("Invalid contract request")),
        }
    }
}

/// Query of `PUT /api/contracts/:id/cost`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostUpdateQuery {
    pub new_amount: Decimal,
}

impl CostUpdateQuery {
    pub fn validated(self) -> Result<Decimal, ApiError> {
        let mut fields = FieldErrors::new();
        if let Some(problem) = amount_problem("New amount", self.new_amount) {
            reject("newAmount", &problem, &mut fields);
        }
        finish(fields)?;
        Ok(self.new_amount.round_dp(2))
    }
}

/// Exclusive upper bound of a `NUMERIC(19, 2)` amount: 17 integer digits.
fn amount_limit() -> Decimal {
    Decimal::new(100_000_000_000_000_000, 0)
}

/// Why `amount` cannot be stored as a cost, if it cannot. Trailing zeros
/// beyond two decimals are fine; any other extra precision is refused.
fn amount_problem(label: &str, amount: Decimal) -> Option<String> {
    if amount <= Decimal::ZERO {
        Some(format!("{label} must be positive"))
    } else if amount.normalize().scale() > 2 {
        Some(format!("{label} must have at most 2 decimal places"))
    } else if amount >= amount_limit() {
        Some(format!("{label} must be less than {}", amount_limit()))
    } else {
        None
    }
}

/// Query of `GET /api/contracts/client/:clientId`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveContractsQuery {
    pub update_date: Option<String>,
}

impl ActiveContractsQuery {
    pub fn updated_since(&self) -> Result<Option<DateTime<Utc>>, ApiError> {
        let mut fields = FieldErrors::new();
        let since = timestamp_field("updateDate", self.update_date.as_deref(), &mut fields);
        finish(fields)?;
        Ok(since)
    }
}

fn timestamp_field(field: &str, raw: Option<&str>, fields: &mut FieldErrors) -> Option<DateTime<Utc>> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        reject(field, "Invalid date, expected RFC 3339 or YYYY-MM-DD", fields);
    }
    parsed
}

/// Parse a caller-supplied instant. Zone-less values are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Contract as returned to callers. The update date stays internal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractResponse {
    pub id: i64,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub cost_amount: Decimal,
}

impl ContractResponse {
    pub fn new(contract: Contract, client_name: Option<String>) -> Self {
        Self {
            id: contract.id,
            client_id: contract.client_id,
            client_name,
            start_date: contract.start_date,
            end_date: contract.end_date,
            cost_amount: contract.cost_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn request(cost: &str) -> ContractRequest {
        ContractRequest {
            client_id: Some(Uuid::new_v4().to_string()),
            cost_amount: Some(cost.parse().unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn start_date_is_optional() {
        let valid = request("100").validated(Utc::now()).unwrap();
        assert_eq!(valid.start_date, None);
        assert_eq!(valid.cost_amount, Decimal::from(100));
    }

    #[test]
    fn rejects_non_positive_cost_and_missing_client() {
        let mut req = request("0");
        req.client_id = None;
        match req.validated(Utc::now()).unwrap_err() {
            ApiError::ValidationError {
                field_errors: Some(fields),
                ..
            } => {
                assert_eq!(fields["costAmount"], "Cost amount must be positive");
                assert_eq!(fields["clientId"], "Client id is required");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_future_start_date() {
        let now = Utc::now();
        let mut req = request("10");
        req.start_date = Some((now + Duration::days(1)).to_rfc3339());
        assert!(req.validated(now).is_err());
    }

    #[test]
    fn parses_supported_timestamp_forms() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01"), Some(midnight));
        assert_eq!(parse_timestamp("2024-03-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_timestamp("2024-03-01T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-03-01T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn cost_update_must_be_positive() {
        let ok = CostUpdateQuery {
            new_amount: Decimal::new(1999, 2),
        };
        assert_eq!(ok.validated().unwrap(), Decimal::new(1999, 2));
        let bad = CostUpdateQuery {
            new_amount: Decimal::new(-1, 0),
        };
        assert!(bad.validated().is_err());
    }

    #[test]
    fn rejects_amounts_the_column_cannot_hold() {
        let reason = |cost: &str| match request(cost).validated(Utc::now()) {
            Err(ApiError::ValidationError {
                field_errors: Some(fields),
                ..
            }) => fields["costAmount"].clone(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(reason("10.005"), "Cost amount must have at most 2 decimal places");
        assert_eq!(reason("0.001"), "Cost amount must have at most 2 decimal places");
        assert_eq!(
            reason("100000000000000000"),
            "Cost amount must be less than 100000000000000000"
        );

        let widest = request("99999999999999999.99").validated(Utc::now()).unwrap();
        assert_eq!(widest.cost_amount.to_string(), "99999999999999999.99");
        let padded = request("125.500").validated(Utc::now()).unwrap();
        assert_eq!(padded.cost_amount.to_string(), "125.50");
    }

    #[test]
    fn cost_update_applies_the_same_limits() {
        for new_amount in [Decimal::new(1999, 3), Decimal::new(10i64.pow(18), 0)] {
            let query = CostUpdateQuery { new_amount };
            assert!(query.validated().is_err(), "{}", new_amount);
        }
    }

    #[test]
    fn response_hides_update_date() {
        let contract = Contract {
            id: 7,
            client_id: None,
            start_date: Utc::now(),
            end_date: None,
            cost_amount: Decimal::from(5),
            update_date: Utc::now(),
        };
        let json = serde_json::to_value(ContractResponse::new(contract, None)).unwrap();
        assert!(json.get("updateDate").is_none());
        assert!(json["costAmount"].is_number());
        assert_eq!(json["costAmount"].to_string(), "5");
    }
}
