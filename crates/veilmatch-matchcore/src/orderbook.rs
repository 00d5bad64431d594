//! Price-time ordered view over one resting snapshot.
//!
//! Uses `BTreeMap` for price-level ordering:
//! - **Bids** (buys): `BTreeMap<Reverse<Decimal>, PriceLevel>` -- highest price first
//! - **Asks** (sells): `BTreeMap<Decimal, PriceLevel>` -- lowest price first
//!
//! The book borrows the decrypted snapshot and never mutates it. Insertion
//! order is the snapshot's order, which the supplier guarantees is arrival
//! order, so the front of each level is the earliest order at that price.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use veilmatch_types::{Order, OrderSide, PairId};

use crate::price_level::PriceLevel;

/// Resting orders for a single pair, arranged for price-time priority.
#[derive(Debug)]
pub struct RestingBook<'a> {
    /// The pair this book serves.
    pub pair_id: PairId,
    /// Buy side: highest price first (`Reverse` key).
    bids: BTreeMap<Reverse<Decimal>, PriceLevel<'a>>,
    /// Sell side: lowest price first.
    asks: BTreeMap<Decimal, PriceLevel<'a>>,
}

impl<'a> RestingBook<'a> {
    /// Create a new empty book for the given pair.
    #[must_use]
    pub fn new(pair_id: PairId) -> Self {
        Self {
            pair_id,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    /// Build a book from a snapshot in arrival order. Orders for other pairs
    /// are ignored.
    #[must_use]
    pub fn from_snapshot(pair_id: PairId, snapshot: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut book = Self::new(pair_id);
        for order in snapshot {
            book.insert_order(order);
        }
        book
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Append an order at the back of its price level. Returns `false` if
    /// the order belongs to another pair.
    pub fn insert_order(&mut self, order: &'a Order) -> bool {
        if order.pair_id != self.pair_id {
            return false;
        }
        match order.side {
            OrderSide::Buy => {
                self.bids
                    .entry(Reverse(order.price))
                    .or_insert_with(|| PriceLevel::new(order.price))
                    .push_back(order);
            }
            OrderSide::Sell => {
                self.asks
                    .entry(order.price)
                    .or_insert_with(|| PriceLevel::new(order.price))
                    .push_back(order);
            }
        }
        true
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Highest-priority order on `side`: best price, then earliest arrival.
    #[must_use]
    pub fn top_of_book(&self, side: OrderSide) -> Option<&'a Order> {
        match side {
            OrderSide::Buy => self.bids.values().next().and_then(PriceLevel::front),
            OrderSide::Sell => self.asks.values().next().and_then(PriceLevel::front),
        }
    }

    /// Returns `true` if the book has no orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
