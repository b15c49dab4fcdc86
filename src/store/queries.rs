//! Thin query functions over a generic `sqlx` executor.
//!
//! Every function here accepts `impl sqlx::PgExecutor<'_>`, which is
//! satisfied by both `&PgPool` (one-shot reads) and `&mut PgConnection` /
//! `&mut Transaction<'_, Postgres>` (reads and writes inside a submission's
//! transaction). This is what lets `matching::engine` open exactly one
//! transaction per `submit`/`cancel` and route every query through it,
//! while `query::QuerySurface` can issue the same queries against a plain
//! pool connection.

use sqlx::PgExecutor;
use uuid::Uuid;

use super::error::StoreError;
use crate::models::{Balance, Direction, Instrument, Order, OrderStatus, OrderType, Trade, User};

pub async fn get_instrument(
    exec: impl PgExecutor<'_>,
    ticker: &str,
) -> Result<Instrument, StoreError> {
    sqlx::query_as::<_, Instrument>(
        "SELECT ticker, name, instrument_type, created_at FROM instruments WHERE ticker = $1",
    )
    .bind(ticker)
    .fetch_optional(exec)
    .await
    .map_err(StoreError::classify)?
    .ok_or(StoreError::NotFound)
}

pub async fn get_user_by_api_key(
    exec: impl PgExecutor<'_>,
    api_key: &str,
) -> Result<User, StoreError> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, role, api_key, created_at FROM users WHERE api_key = $1",
    )
    .bind(api_key)
    .fetch_optional(exec)
    .await
    .map_err(StoreError::classify)?
    .ok_or(StoreError::NotFound)
}

/// `SELECT ... FOR UPDATE`: used during admission funds checks inside the
/// submission transaction, per spec §4.1.
pub async fn get_balance_amount_for_update(
    exec: impl PgExecutor<'_>,
    user_id: Uuid,
    ticker: &str,
) -> Result<i64, StoreError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT amount FROM balances WHERE user_id = $1 AND ticker = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(ticker)
    .fetch_optional(exec)
    .await
    .map_err(StoreError::classify)?;
    Ok(row.map(|(amount,)| amount).unwrap_or(0))
}

pub async fn get_balances(
    exec: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<Balance>, StoreError> {
    sqlx::query_as::<_, Balance>(
        "SELECT user_id, ticker, amount, updated_at FROM balances WHERE user_id = $1 AND amount != 0",
    )
    .bind(user_id)
    .fetch_all(exec)
    .await
    .map_err(StoreError::classify)
}

/// The atomic upsert from spec §4.1: insert-or-increment in one statement,
/// refreshing `updated_at`. This is the contract [`crate::ledger::BalanceLedger`]
/// relies on; rows are created lazily on the first nonzero delta.
pub async fn apply_balance_upsert(
    exec: impl PgExecutor<'_>,
    user_id: Uuid,
    ticker: &str,
    delta: i64,
) -> Result<i64, StoreError> {
    let (amount,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO balances (user_id, ticker, amount, updated_at)
        VALUES ($1, $2, $3, now())
        ON CONFLICT (user_id, ticker)
        DO UPDATE SET amount = balances.amount + excluded.amount, updated_at = now()
        RETURNING amount
        "#,
    )
    .bind(user_id)
    .bind(ticker)
    .bind(delta)
    .fetch_one(exec)
    .await
    .map_err(StoreError::classify)?;
    Ok(amount)
}

pub async fn insert_order(
    exec: impl PgExecutor<'_>,
    user_id: Uuid,
    ticker: &str,
    direction: Direction,
    qty: i64,
    price: Option<i64>,
    order_type: OrderType,
) -> Result<Order, StoreError> {
    let id = Uuid::new_v4();
    sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (id, user_id, ticker, direction, qty, price, order_type, status, filled, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'NEW', 0, now())
        RETURNING id, user_id, ticker, direction, qty, price, order_type, status, filled, timestamp
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(ticker)
    .bind(direction)
    .bind(qty)
    .bind(price)
    .bind(order_type)
    .fetch_one(exec)
    .await
    .map_err(StoreError::classify)
}

pub async fn get_order(exec: impl PgExecutor<'_>, id: Uuid) -> Result<Order, StoreError> {
    sqlx::query_as::<_, Order>(
        "SELECT id, user_id, ticker, direction, qty, price, order_type, status, filled, timestamp
         FROM orders WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(exec)
    .await
    .map_err(StoreError::classify)?
    .ok_or(StoreError::NotFound)
}

pub async fn list_orders(
    exec: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<Order>, StoreError> {
    sqlx::query_as::<_, Order>(
        "SELECT id, user_id, ticker, direction, qty, price, order_type, status, filled, timestamp
         FROM orders WHERE user_id = $1 ORDER BY timestamp DESC",
    )
    .bind(user_id)
    .fetch_all(exec)
    .await
    .map_err(StoreError::classify)
}

/// Resting LIMIT orders of one direction, `status IN (NEW, PARTIALLY_EXECUTED)`,
/// ordered for matching priority: best price first (ascending for asks,
/// descending for bids), then insertion time ascending (FIFO within a level).
///
/// `lock` requests `FOR UPDATE`: the matching path needs it to serialize
/// against a concurrent `submit` crossing the same resting order; the
/// order-book snapshot (read-only, its own transaction) does not.
pub async fn resting_orders(
    exec: impl PgExecutor<'_>,
    ticker: &str,
    direction: Direction,
    lock: bool,
) -> Result<Vec<Order>, StoreError> {
    let order_by = match direction {
        // asks: best = lowest price first
        Direction::Sell => "price ASC, timestamp ASC",
        // bids: best = highest price first
        Direction::Buy => "price DESC, timestamp ASC",
    };
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let sql = format!(
        "SELECT id, user_id, ticker, direction, qty, price, order_type, status, filled, timestamp
         FROM orders
         WHERE ticker = $1 AND direction = $2 AND order_type = 'LIMIT'
           AND status IN ('NEW', 'PARTIALLY_EXECUTED')
         ORDER BY {order_by}{suffix}"
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(ticker)
        .bind(direction)
        .fetch_all(exec)
        .await
        .map_err(StoreError::classify)
}

pub async fn update_order_fill(
    exec: impl PgExecutor<'_>,
    id: Uuid,
    filled: i64,
    status: OrderStatus,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE orders SET filled = $2, status = $3 WHERE id = $1")
        .bind(id)
        .bind(filled)
        .bind(status)
        .execute(exec)
        .await
        .map_err(StoreError::classify)?;
    Ok(())
}

/// Conditional cancel: only open orders owned by `user_id` transition.
/// Returns `true` if a row was updated (spec §4.4, P6 idempotency).
pub async fn cancel_order(
    exec: impl PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'CANCELLED'
         WHERE id = $1 AND user_id = $2 AND status IN ('NEW', 'PARTIALLY_EXECUTED')",
    )
    .bind(id)
    .bind(user_id)
    .execute(exec)
    .await
    .map_err(StoreError::classify)?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_trade(
    exec: impl PgExecutor<'_>,
    ticker: &str,
    amount: i64,
    price: i64,
    buyer_id: Uuid,
    seller_id: Uuid,
) -> Result<Trade, StoreError> {
    sqlx::query_as::<_, Trade>(
        r#"
        INSERT INTO transactions (ticker, amount, price, buyer_id, seller_id, timestamp)
        VALUES ($1, $2, $3, $4, $5, now())
        RETURNING id, ticker, amount, price, buyer_id, seller_id, timestamp
        "#,
    )
    .bind(ticker)
    .bind(amount)
    .bind(price)
    .bind(buyer_id)
    .bind(seller_id)
    .fetch_one(exec)
    .await
    .map_err(StoreError::classify)
}

pub async fn get_transactions(
    exec: impl PgExecutor<'_>,
    ticker: &str,
    limit: i64,
) -> Result<Vec<Trade>, StoreError> {
    sqlx::query_as::<_, Trade>(
        "SELECT id, ticker, amount, price, buyer_id, seller_id, timestamp
         FROM transactions WHERE ticker = $1 ORDER BY id DESC LIMIT $2",
    )
    .bind(ticker)
    .bind(limit)
    .fetch_all(exec)
    .await
    .map_err(StoreError::classify)
}
