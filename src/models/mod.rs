pub mod client;
pub mod contract;

pub use client::{Client, ClientKind, ClientType};
pub use contract::{Contract, NewContract};

use chrono::{DateTime, SubsecRound, Utc};

/// Current instant at the precision the database keeps (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
