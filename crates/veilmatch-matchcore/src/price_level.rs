//! One price in the resting book: a FIFO queue of borrowed orders.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use veilmatch_types::Order;

/// Resting orders sharing a price, earliest arrival at the front.
#[derive(Debug, Clone)]
pub struct PriceLevel<'a> {
    pub price: Decimal,
    queue: VecDeque<&'a Order>,
}

impl<'a> PriceLevel<'a> {
    #[must_use]
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            queue: VecDeque::new(),
        }
    }

    /// Queue behind everything already at this price.
    pub fn push_back(&mut self, order: &'a Order) {
        self.queue.push_back(order);
    }

    /// The order with time priority at this price.
    #[must_use]
    pub fn front(&self) -> Option<&'a Order> {
        self.queue.front().copied()
    }
}
