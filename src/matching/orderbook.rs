//! Order Book (derived view, spec §4.3, C3): an L2 snapshot recomputed
//! from the orders table on every query, not a maintained in-memory
//! index (spec §9 calls this out as a redesign candidate; the external
//! contract documented here is unchanged either way).

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::PgConnection;

use crate::models::{Direction, Order};
use crate::store::{error::StoreError, queries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub price: i64,
    pub qty: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderBookSnapshot {
    pub bid_levels: Vec<Level>,
    pub ask_levels: Vec<Level>,
}

/// Fetch resting orders for both sides and reduce them to an L2 snapshot.
/// Takes a connection (not a generic executor) because it issues two
/// sequential queries against the same handle.
pub async fn snapshot(
    conn: &mut PgConnection,
    ticker: &str,
    limit: usize,
) -> Result<OrderBookSnapshot, StoreError> {
    let bids = queries::resting_orders(&mut *conn, ticker, Direction::Buy, false).await?;
    let asks = queries::resting_orders(&mut *conn, ticker, Direction::Sell, false).await?;

    Ok(OrderBookSnapshot {
        bid_levels: aggregate(&bids, Direction::Buy, limit),
        ask_levels: aggregate(&asks, Direction::Sell, limit),
    })
}

/// Pure aggregation step: sum `qty - filled` per price, drop levels whose
/// remaining quantity is `<= 0`, sort bids descending / asks ascending,
/// and return the top `limit` levels. Unit-tested directly, without a
/// database, against hand-built order vectors.
pub fn aggregate(orders: &[Order], side: Direction, limit: usize) -> Vec<Level> {
    let mut by_price: BTreeMap<i64, i64> = BTreeMap::new();
    for order in orders {
        let Some(price) = order.price else { continue };
        let remaining = order.remaining();
        if remaining <= 0 {
            continue;
        }
        *by_price.entry(price).or_insert(0) += remaining;
    }

    let mut levels: Vec<Level> = by_price
        .into_iter()
        .filter(|(_, qty)| *qty > 0)
        .map(|(price, qty)| Level { price, qty })
        .collect();

    match side {
        Direction::Buy => levels.sort_by(|a, b| b.price.cmp(&a.price)),
        Direction::Sell => levels.sort_by(|a, b| a.price.cmp(&b.price)),
    }
    levels.truncate(limit);
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, OrderType};
    use chrono::Utc;
    use uuid::Uuid;

    fn limit_order(direction: Direction, price: i64, qty: i64, filled: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            ticker: "AAPL".to_string(),
            direction,
            qty,
            price: Some(price),
            order_type: OrderType::Limit,
            status: OrderStatus::from_fill(qty, filled, OrderType::Limit),
            filled,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn aggregates_same_price_level() {
        let orders = vec![
            limit_order(Direction::Sell, 100, 5, 0),
            limit_order(Direction::Sell, 100, 3, 1),
        ];
        let levels = aggregate(&orders, Direction::Sell, 10);
        assert_eq!(levels, vec![Level { price: 100, qty: 7 }]);
    }

    #[test]
    fn drops_fully_filled_levels() {
        let orders = vec![limit_order(Direction::Buy, 50, 5, 5)];
        let levels = aggregate(&orders, Direction::Buy, 10);
        assert!(levels.is_empty());
    }

    #[test]
    fn bids_sort_descending_asks_ascending() {
        let bids = vec![
            limit_order(Direction::Buy, 90, 1, 0),
            limit_order(Direction::Buy, 95, 1, 0),
        ];
        let levels = aggregate(&bids, Direction::Buy, 10);
        assert_eq!(levels[0].price, 95);
        assert_eq!(levels[1].price, 90);

        let asks = vec![
            limit_order(Direction::Sell, 105, 1, 0),
            limit_order(Direction::Sell, 101, 1, 0),
        ];
        let levels = aggregate(&asks, Direction::Sell, 10);
        assert_eq!(levels[0].price, 101);
        assert_eq!(levels[1].price, 105);
    }

    #[test]
    fn truncates_to_limit() {
        let orders = (0..5)
            .map(|i| limit_order(Direction::Sell, 100 + i, 1, 0))
            .collect::<Vec<_>>();
        let levels = aggregate(&orders, Direction::Sell, 2);
        assert_eq!(levels.len(), 2);
    }
}
