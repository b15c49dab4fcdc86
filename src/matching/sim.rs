//! A pure, in-memory replay harness used only by property tests (spec §8).
//!
//! It drives [`super::core::match_against`] against a plain `Vec` order
//! book and applies the resulting balance deltas with the same arithmetic
//! `BalanceLedger` uses, without touching a database. This is what lets
//! P1/P2/P4/P6 run as fast randomized sweeps.

#![cfg(test)]

use std::collections::HashMap;

use uuid::Uuid;

use super::core::{match_against, RestingMaker, TakerIntent};
use crate::models::{Direction, OrderType, RUB};

#[derive(Debug, Clone)]
pub struct SimOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub direction: Direction,
    pub qty: i64,
    pub order_type: OrderType,
    pub price: Option<i64>,
    pub filled: i64,
}

pub struct Sim {
    pub ticker: &'static str,
    pub balances: HashMap<(Uuid, &'static str), i64>,
    bids: Vec<SimOrder>,
    asks: Vec<SimOrder>,
}

impl Sim {
    pub fn new(ticker: &'static str) -> Self {
        Self {
            ticker,
            balances: HashMap::new(),
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    pub fn deposit(&mut self, user: Uuid, ticker: &'static str, amount: i64) {
        *self.balances.entry((user, ticker)).or_insert(0) += amount;
    }

    fn balance(&self, user: Uuid, ticker: &'static str) -> i64 {
        *self.balances.get(&(user, ticker)).unwrap_or(&0)
    }

    fn credit(&mut self, user: Uuid, ticker: &'static str, delta: i64) {
        *self.balances.entry((user, ticker)).or_insert(0) += delta;
    }

    fn book_mut(&mut self, direction: Direction) -> &mut Vec<SimOrder> {
        match direction {
            Direction::Buy => &mut self.bids,
            Direction::Sell => &mut self.asks,
        }
    }

    /// Admission + matching for one order, mirroring `matching::engine`.
    /// Returns `false` if admission was rejected (no state change).
    pub fn submit(
        &mut self,
        user: Uuid,
        direction: Direction,
        qty: i64,
        order_type: OrderType,
        price: Option<i64>,
    ) -> bool {
        if qty <= 0 {
            return false;
        }
        match direction {
            Direction::Buy => {
                let required = qty * price.unwrap_or(1);
                if self.balance(user, RUB) < required {
                    return false;
                }
            }
            Direction::Sell => {
                if self.balance(user, self.ticker) < qty {
                    return false;
                }
            }
        }

        let opposite = direction.opposite();
        let mut makers: Vec<RestingMaker> = self
            .book_mut(opposite)
            .iter()
            .map(|o| RestingMaker {
                order_id: o.id,
                user_id: o.user_id,
                price: o.price.expect("resting orders are LIMIT"),
                available: o.qty - o.filled,
            })
            .collect();

        let taker = TakerIntent {
            order_id: Uuid::new_v4(),
            user_id: user,
            direction,
            qty,
            order_type,
            price,
        };

        let outcome = match_against(&taker, &mut makers);

        for fill in &outcome.fills {
            let (buyer, seller) = match direction {
                Direction::Buy => (user, fill.maker_user_id),
                Direction::Sell => (fill.maker_user_id, user),
            };
            let notional = fill.qty * fill.price;
            self.credit(buyer, self.ticker, fill.qty);
            self.credit(buyer, RUB, -notional);
            self.credit(seller, self.ticker, -fill.qty);
            self.credit(seller, RUB, notional);
        }

        // write back maker fills
        {
            let book = self.book_mut(opposite);
            for (maker, order) in makers.iter().zip(book.iter_mut()) {
                order.filled = order.qty - maker.available;
            }
            book.retain(|o| o.filled < o.qty);
        }

        if order_type == OrderType::Limit && outcome.taker_filled < qty {
            self.book_mut(direction).push(SimOrder {
                id: taker.order_id,
                user_id: user,
                direction,
                qty,
                order_type,
                price,
                filled: outcome.taker_filled,
            });
        }

        true
    }

    pub fn total(&self, ticker: &'static str) -> i64 {
        self.balances
            .iter()
            .filter(|((_, t), _)| *t == ticker)
            .map(|(_, amount)| *amount)
            .sum()
    }

    pub fn any_negative(&self) -> bool {
        self.balances.values().any(|v| *v < 0)
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Action {
        Limit { buyer: bool, qty: i64, price: i64 },
        Market { buyer: bool, qty: i64 },
    }

    fn action_strategy() -> impl Strategy<Value = Action> {
        prop_oneof![
            (any::<bool>(), 1i64..20, 1i64..50)
                .prop_map(|(buyer, qty, price)| Action::Limit { buyer, qty, price }),
            (any::<bool>(), 1i64..20).prop_map(|(buyer, qty)| Action::Market { buyer, qty }),
        ]
    }

    proptest! {
        /// P1 (conservation) and P2 (non-negativity) across randomized order flows.
        #[test]
        fn conservation_and_non_negativity(actions in prop::collection::vec(action_strategy(), 0..60)) {
            let ticker = "AAPL";
            let mut sim = Sim::new(ticker);
            let alice = Uuid::from_u128(1);
            let bob = Uuid::from_u128(2);
            sim.deposit(alice, RUB, 100_000);
            sim.deposit(bob, RUB, 100_000);
            sim.deposit(alice, ticker, 1_000);
            sim.deposit(bob, ticker, 1_000);

            let rub_before = sim.total(RUB);
            let asset_before = sim.total(ticker);

            for action in actions {
                match action {
                    Action::Limit { buyer, qty, price } => {
                        let user = if buyer { alice } else { bob };
                        let direction = if buyer { Direction::Buy } else { Direction::Sell };
                        sim.submit(user, direction, qty, OrderType::Limit, Some(price));
                    }
                    Action::Market { buyer, qty } => {
                        let user = if buyer { alice } else { bob };
                        let direction = if buyer { Direction::Buy } else { Direction::Sell };
                        sim.submit(user, direction, qty, OrderType::Market, None);
                    }
                }
                prop_assert!(!sim.any_negative());
            }

            prop_assert_eq!(sim.total(RUB), rub_before);
            prop_assert_eq!(sim.total(ticker), asset_before);
        }
    }

    /// P6: cancelling (simulated as simply never resubmitting) an executed
    /// or already-removed order has no further effect - the book simply
    /// does not contain it to act on twice.
    #[test]
    fn market_against_empty_book_is_a_no_op() {
        let ticker = "AAPL";
        let mut sim = Sim::new(ticker);
        let alice = Uuid::from_u128(1);
        sim.deposit(alice, RUB, 1_000);
        let before = sim.total(RUB);
        sim.submit(alice, Direction::Buy, 5, OrderType::Market, None);
        assert_eq!(sim.total(RUB), before);
    }
}
