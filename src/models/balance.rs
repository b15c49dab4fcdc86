use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// `(user_id, ticker) -> amount`. Rows are created lazily by the first
/// upsert that touches a key; there is no separate "ensure row exists" step.
///
/// I-B1: `amount >= 0` at every committed state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Balance {
    pub user_id: Uuid,
    pub ticker: String,
    pub amount: i64,
    pub updated_at: DateTime<Utc>,
}

/// A single signed adjustment to one `(user_id, ticker)` balance, as
/// produced by a trade. Several of these are collapsed and sorted by
/// [`crate::ledger::BalanceLedger::apply`] before being applied.
#[derive(Debug, Clone)]
pub struct BalanceChange {
    pub user_id: Uuid,
    pub ticker: String,
    pub delta: i64,
}

impl BalanceChange {
    pub fn new(user_id: Uuid, ticker: impl Into<String>, delta: i64) -> Self {
        Self {
            user_id,
            ticker: ticker.into(),
            delta,
        }
    }
}
