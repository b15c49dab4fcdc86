//! Matching Engine (spec §4.4, C4): admits orders, runs the matching
//! algorithm, emits trades, updates order states, invokes the Balance
//! Ledger. Exactly one transaction commits per submitted order.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::EngineError;
use crate::ledger::BalanceLedger;
use crate::models::{
    BalanceChange, Direction, Order, OrderStatus, OrderSpec, OrderType, RUB,
};
use crate::store::queries;

use super::core::{match_against, RestingMaker, TakerIntent};

pub struct MatchingEngine {
    pool: PgPool,
    ledger: BalanceLedger,
}

impl MatchingEngine {
    pub fn new(pool: PgPool, ledger: BalanceLedger) -> Self {
        Self { pool, ledger }
    }

    /// `submit(user, order_spec)` — spec §4.4. Returns the new order id.
    pub async fn submit(&self, user_id: Uuid, spec: OrderSpec) -> Result<Uuid, EngineError> {
        validate(&spec)?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            EngineError::StoreUnavailable(e.to_string())
        })?;

        // Admission: instrument exists.
        queries::get_instrument(&mut *tx, &spec.ticker)
            .await
            .map_err(|e| match e {
                crate::store::error::StoreError::NotFound => EngineError::InstrumentNotFound,
                other => other.into(),
            })?;

        // Admission: funds check against committed balances, row-locked.
        match spec.direction {
            Direction::Buy => {
                let required = match spec.order_type {
                    OrderType::Limit => spec.qty * spec.price.expect("validated"),
                    // MARKET floor: qty * 1, per spec §4.4 / §9 open question.
                    OrderType::Market => spec.qty,
                };
                let available =
                    queries::get_balance_amount_for_update(&mut *tx, user_id, RUB).await?;
                if available < required {
                    return Err(EngineError::InsufficientFunds {
                        required,
                        available,
                    });
                }
            }
            Direction::Sell => {
                let available =
                    queries::get_balance_amount_for_update(&mut *tx, user_id, &spec.ticker)
                        .await?;
                if available < spec.qty {
                    return Err(EngineError::InsufficientAsset {
                        required: spec.qty,
                        available,
                    });
                }
            }
        }

        let order =
            queries::insert_order(&mut *tx, user_id, &spec.ticker, spec.direction, spec.qty, spec.price, spec.order_type)
                .await?;

        self.run_match(&mut tx, &order).await?;

        tx.commit().await.map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        Ok(order.id)
    }

    async fn run_match(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        taker_order: &Order,
    ) -> Result<(), EngineError> {
        let opposite = taker_order.direction.opposite();
        let resting = queries::resting_orders(&mut **tx, &taker_order.ticker, opposite, true).await?;

        let mut makers: Vec<RestingMaker> = resting
            .iter()
            .map(|o| RestingMaker {
                order_id: o.id,
                user_id: o.user_id,
                price: o.price.expect("resting orders are always LIMIT"),
                available: o.remaining(),
            })
            .collect();

        let taker = TakerIntent {
            order_id: taker_order.id,
            user_id: taker_order.user_id,
            direction: taker_order.direction,
            qty: taker_order.qty,
            order_type: taker_order.order_type,
            price: taker_order.price,
        };

        let outcome = match_against(&taker, &mut makers);

        let mut balance_changes = Vec::new();

        for fill in &outcome.fills {
            let maker_order = &resting[fill.maker_index];
            let (buyer_id, seller_id) = match taker_order.direction {
                Direction::Buy => (taker_order.user_id, fill.maker_user_id),
                Direction::Sell => (fill.maker_user_id, taker_order.user_id),
            };

            queries::insert_trade(
                &mut **tx,
                &taker_order.ticker,
                fill.qty,
                fill.price,
                buyer_id,
                seller_id,
            )
            .await?;

            let notional = fill.qty * fill.price;
            balance_changes.push(BalanceChange::new(buyer_id, taker_order.ticker.clone(), fill.qty));
            balance_changes.push(BalanceChange::new(buyer_id, RUB, -notional));
            balance_changes.push(BalanceChange::new(seller_id, taker_order.ticker.clone(), -fill.qty));
            balance_changes.push(BalanceChange::new(seller_id, RUB, notional));

            let new_filled = maker_order.filled + fill.qty;
            let new_status = OrderStatus::from_fill(maker_order.qty, new_filled, maker_order.order_type);
            queries::update_order_fill(&mut **tx, maker_order.id, new_filled, new_status).await?;

            info!(
                order_id = %maker_order.id,
                ticker = %taker_order.ticker,
                qty = fill.qty,
                price = fill.price,
                "maker order filled"
            );
        }

        let taker_filled = outcome.taker_filled;
        let taker_status = OrderStatus::from_fill(taker_order.qty, taker_filled, taker_order.order_type);
        queries::update_order_fill(&mut **tx, taker_order.id, taker_filled, taker_status).await?;

        info!(
            order_id = %taker_order.id,
            ticker = %taker_order.ticker,
            filled = taker_filled,
            qty = taker_order.qty,
            status = ?taker_status,
            "order matched"
        );

        if !balance_changes.is_empty() {
            self.ledger.apply(tx, balance_changes).await?;
        }

        Ok(())
    }

    /// `cancel(order_id, user)` — spec §4.4. Bypasses matching entirely.
    pub async fn cancel(&self, order_id: Uuid, user_id: Uuid) -> Result<bool, EngineError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            EngineError::StoreUnavailable(e.to_string())
        })?;
        let cancelled = queries::cancel_order(&mut *tx, order_id, user_id).await?;
        tx.commit().await.map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        Ok(cancelled)
    }
}

fn validate(spec: &OrderSpec) -> Result<(), EngineError> {
    if spec.qty <= 0 {
        return Err(EngineError::InvalidOrder("qty must be positive".into()));
    }
    match spec.order_type {
        OrderType::Limit => {
            match spec.price {
                Some(p) if p > 0 => {}
                Some(_) => return Err(EngineError::InvalidOrder("price must be positive".into())),
                None => return Err(EngineError::InvalidOrder("LIMIT order requires a price".into())),
            }
        }
        OrderType::Market => {
            if spec.price.is_some() {
                return Err(EngineError::InvalidOrder("MARKET order must not specify a price".into()));
            }
        }
    }
    Ok(())
}
