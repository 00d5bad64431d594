//! Plaintext order model.
//!
//! An [`Order`] only ever exists inside the trusted boundary, after the
//! ingress plane has decrypted and decoded an envelope. It carries two
//! distinct addresses:
//!
//! - `owner_identity`: the persistent, compliance-checked account
//! - `recipient_address`: where settled assets are paid (may be a shield address)
//!
//! The compliance gate only ever looks at the former, settlement only ever
//! pays the latter.

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OrderId, PairId};

/// Which side of the book this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    #[serde(alias = "buy", alias = "Buy")]
    Buy,
    #[serde(alias = "sell", alias = "Sell")]
    Sell,
}

impl OrderSide {
    /// The side a counterparty must be on.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A decrypted, validated limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Always the caller-supplied id, never the one inside the ciphertext.
    pub id: OrderId,
    pub pair_id: PairId,
    pub side: OrderSide,
    pub amount: Decimal,
    pub price: Decimal,
    pub recipient_address: Address,
    pub owner_identity: Address,
}

impl Order {
    /// Would this order trade against a counterparty quoting `price`?
    #[must_use]
    pub fn accepts_price(&self, price: Decimal) -> bool {
        match self.side {
            OrderSide::Buy => price <= self.price,
            OrderSide::Sell => price >= self.price,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(id: &str, side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self {
            id: OrderId::new(id),
            pair_id: PairId::new("ETH-USDC"),
            side,
            amount,
            price,
            recipient_address: Address::repeat_byte(0xaa),
            owner_identity: Address::repeat_byte(0xbb),
        }
    }

    #[must_use]
    pub fn with_addresses(mut self, owner: Address, recipient: Address) -> Self {
        self.owner_identity = owner;
        self.recipient_address = recipient;
        self
    }
}
