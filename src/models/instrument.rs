use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The reserved quote-asset ticker. Every trade settles in this asset.
pub const RUB: &str = "RUB";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Instrument {
    pub ticker: String,
    pub name: String,
    #[sqlx(rename = "instrument_type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl Instrument {
    pub fn is_quote_asset(&self) -> bool {
        self.ticker == RUB
    }
}
