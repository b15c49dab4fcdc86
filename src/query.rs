//! Query Surface (spec §4.5, C5): read-only L2 snapshot, order lookup,
//! user-balance view. Every method sees a consistent snapshot of one
//! Store transaction.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::EngineError;
use crate::matching::orderbook::{self, OrderBookSnapshot};
use crate::models::{Order, Trade};
use crate::store::queries;

pub struct QuerySurface {
    pool: PgPool,
}

impl QuerySurface {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_orderbook(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<OrderBookSnapshot, EngineError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        let snapshot = orderbook::snapshot(&mut *tx, ticker, limit).await?;
        tx.rollback()
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        Ok(snapshot)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, EngineError> {
        queries::get_order(&self.pool, id).await.map_err(Into::into)
    }

    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, EngineError> {
        queries::list_orders(&self.pool, user_id).await.map_err(Into::into)
    }

    pub async fn get_balances(&self, user_id: Uuid) -> Result<Vec<(String, i64)>, EngineError> {
        let rows = queries::get_balances(&self.pool, user_id).await?;
        Ok(rows.into_iter().map(|b| (b.ticker, b.amount)).collect())
    }

    pub async fn get_transactions(
        &self,
        ticker: &str,
        limit: i64,
    ) -> Result<Vec<Trade>, EngineError> {
        queries::get_transactions(&self.pool, ticker, limit)
            .await
            .map_err(Into::into)
    }
}
