use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A settled match between two orders. Immutable after insert; `id` is a
/// database-assigned monotonically increasing integer (per spec §5, this is
/// per-process ordering only — consumers sort by `(timestamp, id)`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: i64,
    pub ticker: String,
    pub amount: i64,
    pub price: i64,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub timestamp: DateTime<Utc>,
}
