use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A persisted contract.
///
/// `update_date` is bookkeeping owned by the service layer: it is stamped on
/// every create and mutation and never leaves the process in a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub id: i64,
    pub client_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub cost_amount: Decimal,
    pub update_date: DateTime<Utc>,
}

impl Contract {
    /// Active means no end date, or an end date strictly after `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date.map_or(true, |end| end > now)
    }

    /// Stamp a mutation. The update date always moves forward, even when
    /// `now` does not (clock skew or two writes in the same microsecond).
    pub fn on_update(&mut self, now: DateTime<Utc>) {
        self.update_date = if now > self.update_date {
            now
        } else {
            self.update_date + Duration::microseconds(1)
        };
    }

    pub fn set_cost_amount(&mut self, amount: Decimal, now: DateTime<Utc>) {
        self.cost_amount = amount;
        self.on_update(now);
    }

    /// Close the contract at `now` and detach it from its client.
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.end_date = Some(now);
        self.client_id = None;
        self.on_update(now);
    }
}

/// A contract that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContract {
    pub client_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub cost_amount: Decimal,
    pub update_date: DateTime<Utc>,
}

impl NewContract {
    /// Build a contract for `client_id`, applying the creation rules: a
    /// missing start date becomes `now`, and the update date is `now`.
    pub fn for_client(
        client_id: Uuid,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        cost_amount: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            client_id: Some(client_id),
            start_date: start_date.unwrap_or(now),
            end_date,
            cost_amount,
            update_date: now,
        }
    }

    pub fn on_create(&mut self, now: DateTime<Utc>) {
        self.update_date = now;
    }
}
