//! Identifiers used throughout VeilMatch.
//!
//! Order and pair identifiers are opaque strings assigned by the untrusted
//! backend. They are used for bookkeeping and correlation only, never for
//! authentication. `MatchId` is derived inside the enclave and is
//! deterministic for a given (pair, buyer, seller) triple.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Opaque order identifier supplied by the trigger / resting-order source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// PairId
// ---------------------------------------------------------------------------

/// Identifier of the instrument / market an order trades on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(pub String);

impl PairId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PairId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// MatchId
// ---------------------------------------------------------------------------

/// Deterministic 32-byte identifier of a single match.
///
/// Used as the `bytes32 orderId` of the on-chain settlement report and as
/// the per-trade nonce when deriving stealth addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MatchId(pub [u8; 32]);

impl MatchId {
    /// Derive the match id from the pair and both order ids.
    ///
    /// Each component is length-prefixed so that `("ab", "c")` and
    /// `("a", "bc")` never collide.
    #[must_use]
    pub fn derive(pair_id: &PairId, buyer: &OrderId, seller: &OrderId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"veilmatch:match_id:v1:");
        for part in [pair_id.as_str(), buyer.as_str(), seller.as_str()] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_serializes_as_plain_string() {
        let id = OrderId::new("ord-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ord-1\"");
        let back: OrderId = serde_json::from_str("\"ord-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn match_id_deterministic() {
        let pair = PairId::new("ETH-USDC");
        let a = MatchId::derive(&pair, &"b1".into(), &"s1".into());
        let b = MatchId::derive(&pair, &"b1".into(), &"s1".into());
        assert_eq!(a, b);
    }

    #[test]
    fn match_id_depends_on_roles() {
        let pair = PairId::new("ETH-USDC");
        let a = MatchId::derive(&pair, &"x".into(), &"y".into());
        let b = MatchId::derive(&pair, &"y".into(), &"x".into());
        assert_ne!(a, b);
    }

    #[test]
    fn match_id_length_prefix_prevents_concatenation_collisions() {
        let pair = PairId::new("p");
        let a = MatchId::derive(&pair, &"ab".into(), &"c".into());
        let b = MatchId::derive(&pair, &"a".into(), &"bc".into());
        assert_ne!(a, b);
    }

    #[test]
    fn match_id_hex_is_prefixed() {
        let id = MatchId([0xab; 32]);
        let hex = id.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
    }
}
