//! Balance Ledger (spec §4.2, C2): atomic upsert-style credits/debits with
//! deadlock retry and a deterministic resource-acquisition order.

use std::collections::HashMap;
use std::sync::OnceLock;

use rand::Rng;
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::BalanceChange;
use crate::store::{error::StoreError, queries};

#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 10,
        }
    }
}

/// Process-wide single-writer lock serializing the settlement critical
/// section inside one process (spec §4.2: "reference design choice, not a
/// correctness requirement" — cross-process safety rests on Store row
/// locks plus the deterministic key order below).
static SETTLEMENT_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn settlement_lock() -> &'static Mutex<()> {
    SETTLEMENT_LOCK.get_or_init(|| Mutex::new(()))
}

pub struct BalanceLedger {
    config: LedgerConfig,
}

impl BalanceLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// Collapse, sort into the global acquisition order, and apply every
    /// change within `tx`, retrying individual upserts on `Conflict`.
    pub async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        changes: Vec<BalanceChange>,
    ) -> Result<(), StoreError> {
        let collapsed = collapse(changes);
        if collapsed.is_empty() {
            return Ok(());
        }

        let _guard = settlement_lock().lock().await;

        for change in collapsed {
            self.apply_one(tx, &change).await?;
        }
        Ok(())
    }

    async fn apply_one(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        change: &BalanceChange,
    ) -> Result<(), StoreError> {
        let mut attempt = 0;
        loop {
            match queries::apply_balance_upsert(
                &mut **tx,
                change.user_id,
                &change.ticker,
                change.delta,
            )
            .await
            {
                Ok(amount) => {
                    debug!(
                        user_id = %change.user_id,
                        ticker = %change.ticker,
                        delta = change.delta,
                        new_amount = amount,
                        "balance upserted"
                    );
                    return Ok(());
                }
                Err(StoreError::Conflict(msg)) if attempt < self.config.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(
                        user_id = %change.user_id,
                        ticker = %change.ticker,
                        attempt,
                        %msg,
                        delay_ms = delay.as_millis() as u64,
                        "balance upsert conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// `delay = U(0.01, 0.1) * 2^attempt` seconds.
    fn backoff(&self, attempt: u32) -> std::time::Duration {
        let jitter = rand::thread_rng().gen_range(0.01_f64..0.1_f64);
        let seconds = jitter * 2f64.powi(attempt as i32);
        std::time::Duration::from_secs_f64(seconds)
    }
}

/// Collapse duplicate `(user_id, ticker)` deltas and sort by the
/// lexicographic key `(user_id_bytes, ticker)` — the global resource
/// acquisition order from spec §4.2, which guarantees every participant in
/// any trade touches balances in identical order.
fn collapse(changes: Vec<BalanceChange>) -> Vec<BalanceChange> {
    let mut by_key: HashMap<(Uuid, String), i64> = HashMap::new();
    for change in changes {
        *by_key.entry((change.user_id, change.ticker)).or_insert(0) += change.delta;
    }
    let mut out: Vec<BalanceChange> = by_key
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .map(|((user_id, ticker), delta)| BalanceChange::new(user_id, ticker, delta))
        .collect();
    out.sort_by(|a, b| {
        (a.user_id.as_bytes(), a.ticker.as_str()).cmp(&(b.user_id.as_bytes(), b.ticker.as_str()))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(user: Uuid, ticker: &str, delta: i64) -> BalanceChange {
        BalanceChange::new(user, ticker, delta)
    }

    #[test]
    fn collapses_duplicate_keys() {
        let u = Uuid::new_v4();
        let changes = vec![change(u, "AAPL", 5), change(u, "AAPL", -2)];
        let out = collapse(changes);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].delta, 3);
    }

    #[test]
    fn drops_zero_sum() {
        let u = Uuid::new_v4();
        let changes = vec![change(u, "AAPL", 5), change(u, "AAPL", -5)];
        assert!(collapse(changes).is_empty());
    }

    #[test]
    fn sorts_by_user_then_ticker() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let changes = vec![
            change(u2, "AAPL", 1),
            change(u1, "RUB", 1),
            change(u1, "AAPL", 1),
        ];
        let out = collapse(changes);
        assert_eq!(out[0].user_id, u1);
        assert_eq!(out[0].ticker, "AAPL");
        assert_eq!(out[1].user_id, u1);
        assert_eq!(out[1].ticker, "RUB");
        assert_eq!(out[2].user_id, u2);
    }
}
