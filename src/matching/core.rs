//! Pure matching algorithm (spec §4.4): no database dependency, so the
//! scenarios and invariants in spec §8 can run as plain unit/property
//! tests. `matching::engine` is the thin transactional shell around this.

use uuid::Uuid;

use crate::models::{Direction, OrderType};

/// The incoming order, as seen by the matcher. `price` is `None` for MARKET.
#[derive(Debug, Clone, Copy)]
pub struct TakerIntent {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub direction: Direction,
    pub qty: i64,
    pub order_type: OrderType,
    pub price: Option<i64>,
}

/// A resting LIMIT order, pre-sorted best-price-first / time-ascending by
/// the caller (this module trusts the caller's ordering; it never sorts).
#[derive(Debug, Clone, Copy)]
pub struct RestingMaker {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub price: i64,
    pub available: i64,
}

/// One resting order fully or partially consumed by the taker.
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    pub maker_index: usize,
    pub maker_order_id: Uuid,
    pub maker_user_id: Uuid,
    pub qty: i64,
    /// Maker-price rule (spec P5): execution price is the resting order's price.
    pub price: i64,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub fills: Vec<Fill>,
    pub taker_filled: i64,
}

impl MatchOutcome {
    pub fn taker_remaining(&self, taker_qty: i64) -> i64 {
        taker_qty - self.taker_filled
    }
}

/// Walk `resting` (already ordered best-first / FIFO) and fill `taker`
/// against it under price-time priority. Mutates `resting[i].available` in
/// place so the caller can persist the post-match remaining quantities.
pub fn match_against(taker: &TakerIntent, resting: &mut [RestingMaker]) -> MatchOutcome {
    let mut fills = Vec::new();
    let mut taker_filled: i64 = 0;

    for (index, maker) in resting.iter_mut().enumerate() {
        if taker_filled >= taker.qty {
            break;
        }
        if maker.available <= 0 {
            continue;
        }
        if let (OrderType::Limit, Some(limit_price)) = (taker.order_type, taker.price) {
            let crosses = match taker.direction {
                // incoming BUY crosses an ask only if ask price <= limit
                Direction::Buy => maker.price <= limit_price,
                // incoming SELL crosses a bid only if bid price >= limit
                Direction::Sell => maker.price >= limit_price,
            };
            if !crosses {
                // Resting orders are price-sorted best-first: once one
                // level fails to cross, no later (worse) level can either.
                break;
            }
        }

        let remaining = taker.qty - taker_filled;
        let execute_qty = remaining.min(maker.available);
        if execute_qty <= 0 {
            continue;
        }

        maker.available -= execute_qty;
        taker_filled += execute_qty;

        fills.push(Fill {
            maker_index: index,
            maker_order_id: maker.order_id,
            maker_user_id: maker.user_id,
            qty: execute_qty,
            price: maker.price,
        });
    }

    MatchOutcome {
        fills,
        taker_filled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taker(direction: Direction, qty: i64, order_type: OrderType, price: Option<i64>) -> TakerIntent {
        TakerIntent {
            order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            direction,
            qty,
            order_type,
            price,
        }
    }

    fn maker(price: i64, available: i64) -> RestingMaker {
        RestingMaker {
            order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            price,
            available,
        }
    }

    /// Scenario 1: simple crossing LIMIT, full fill both sides.
    #[test]
    fn simple_crossing_limit() {
        let t = taker(Direction::Buy, 5, OrderType::Limit, Some(100));
        let mut book = vec![maker(100, 5)];
        let outcome = match_against(&t, &mut book);
        assert_eq!(outcome.taker_filled, 5);
        assert_eq!(outcome.fills.len(), 1);
        assert_eq!(outcome.fills[0].price, 100);
        assert_eq!(book[0].available, 0);
    }

    /// Scenario 2: partial fill, resting remainder.
    #[test]
    fn partial_fill_leaves_remainder() {
        let t = taker(Direction::Buy, 3, OrderType::Limit, Some(50));
        let mut book = vec![maker(50, 10)];
        let outcome = match_against(&t, &mut book);
        assert_eq!(outcome.taker_filled, 3);
        assert_eq!(book[0].available, 7);
    }

    /// Scenario 3: MARKET sweep across two price levels.
    #[test]
    fn market_sweeps_multiple_levels() {
        let t = taker(Direction::Buy, 4, OrderType::Market, None);
        let mut book = vec![maker(100, 2), maker(101, 5)];
        let outcome = match_against(&t, &mut book);
        assert_eq!(outcome.taker_filled, 4);
        assert_eq!(outcome.fills.len(), 2);
        assert_eq!(outcome.fills[0].price, 100);
        assert_eq!(outcome.fills[0].qty, 2);
        assert_eq!(outcome.fills[1].price, 101);
        assert_eq!(outcome.fills[1].qty, 2);
        assert_eq!(book[0].available, 0);
        assert_eq!(book[1].available, 3);
    }

    /// Scenario 4: MARKET against an empty book fills nothing.
    #[test]
    fn market_against_empty_book() {
        let t = taker(Direction::Buy, 1, OrderType::Market, None);
        let mut book: Vec<RestingMaker> = vec![];
        let outcome = match_against(&t, &mut book);
        assert_eq!(outcome.taker_filled, 0);
        assert!(outcome.fills.is_empty());
    }

    /// LIMIT stops as soon as the next level fails to cross (P4).
    #[test]
    fn limit_stops_at_non_crossing_price() {
        let t = taker(Direction::Buy, 10, OrderType::Limit, Some(100));
        let mut book = vec![maker(100, 2), maker(102, 5)];
        let outcome = match_against(&t, &mut book);
        assert_eq!(outcome.taker_filled, 2);
        assert_eq!(outcome.fills.len(), 1);
        assert_eq!(book[1].available, 5);
    }

    /// P5: trade price is always the maker's price, never the taker's limit.
    #[test]
    fn maker_price_rule_sell_side() {
        let t = taker(Direction::Sell, 5, OrderType::Limit, Some(90));
        let mut book = vec![maker(95, 5)];
        let outcome = match_against(&t, &mut book);
        assert_eq!(outcome.fills[0].price, 95);
    }
}
