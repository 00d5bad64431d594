//! Match outcome produced by MatchCore.
//!
//! A [`MatchResult`] is created only when the matching engine finds a
//! counterparty. It is the single input to the compliance gate and to every
//! settlement emitter.

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MatchId, Order, OrderId, OrderSide, PairId, Result, VeilmatchError};

/// One side of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    pub id: OrderId,
    /// Persistent identity, checked by the compliance gate.
    pub owner_identity: Address,
    /// Payout address, used by settlement.
    pub recipient_address: Address,
}

impl From<&Order> for Counterparty {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            owner_identity: order.owner_identity,
            recipient_address: order.recipient_address,
        }
    }
}

/// A matched buyer/seller pair with its trade size and execution price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub match_id: MatchId,
    pub pair_id: PairId,
    pub buyer: Counterparty,
    pub seller: Counterparty,
    /// Base amount exchanged.
    pub trade_amount: Decimal,
    /// Quote per base unit.
    pub execution_price: Decimal,
    /// Side of the incoming (aggressive) order.
    pub taker_side: OrderSide,
}

impl MatchResult {
    /// Quote amount = `trade_amount` × `execution_price`, computed exactly.
    pub fn quote_amount(&self) -> Result<Decimal> {
        self.trade_amount
            .checked_mul(self.execution_price)
            .map(|q| q.normalize())
            .ok_or_else(|| VeilmatchError::AmountOverflow {
                reason: format!(
                    "quote amount overflows for {} ({} × {})",
                    self.match_id, self.trade_amount, self.execution_price
                ),
            })
    }

    /// Order id of the resting side of this match.
    #[must_use]
    pub fn maker_order_id(&self) -> &OrderId {
        match self.taker_side {
            OrderSide::Buy => &self.seller.id,
            OrderSide::Sell => &self.buyer.id,
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Match[{}] {} buyer={} seller={} taker={}",
            self.match_id, self.pair_id, self.buyer.id, self.seller.id, self.taker_side,
        )
    }
}
