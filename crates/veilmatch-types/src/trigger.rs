//! Trigger payload and handler response shapes.
//!
//! The trigger is untrusted JSON from the workflow runner. The response is
//! always a JSON object with a `status` of `matched`, `pending`, or `failed`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{MatchResult, OrderId, PairId, Result, VeilmatchError, constants};

/// Raw trigger as received. Only `action` is required at this level.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub action: String,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub pair_id: Option<PairId>,
    #[serde(default)]
    pub encrypted_order: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// A validated `match_order` trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOrderTrigger {
    pub order_id: OrderId,
    pub pair_id: PairId,
    /// Base64 ECIES envelope.
    pub encrypted_order: String,
    /// Hex ECDSA signature from the submitter; carried, not interpreted.
    pub signature: Option<String>,
}

impl TriggerRequest {
    /// Parse raw bytes into a request.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| VeilmatchError::InvalidTrigger {
            reason: e.to_string(),
        })
    }

    /// Check the action and required fields.
    pub fn into_match_order(self) -> Result<MatchOrderTrigger> {
        if self.action != constants::ACTION_MATCH_ORDER {
            return Err(VeilmatchError::UnknownAction(self.action));
        }
        let order_id = self
            .order_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| VeilmatchError::InvalidTrigger {
                reason: "missing orderId".into(),
            })?;
        let pair_id = self.pair_id.ok_or_else(|| VeilmatchError::InvalidTrigger {
            reason: "missing pairId".into(),
        })?;
        let encrypted_order = self
            .encrypted_order
            .filter(|e| !e.is_empty())
            .ok_or_else(|| VeilmatchError::InvalidTrigger {
                reason: "missing encryptedOrder".into(),
            })?;
        Ok(MatchOrderTrigger {
            order_id,
            pair_id,
            encrypted_order,
            signature: self.signature,
        })
    }
}

/// Terminal status of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Matched,
    Pending,
    Failed,
}

/// Why a found match was not settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingReason {
    BuyerNotVerified,
    SellerNotVerified,
}

/// Public summary of a match. Addresses are deliberately omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: String,
    pub buyer_order_id: OrderId,
    pub seller_order_id: OrderId,
    pub trade_amount: Decimal,
    pub execution_price: Decimal,
}

impl From<&MatchResult> for MatchSummary {
    fn from(m: &MatchResult) -> Self {
        Self {
            match_id: m.match_id.to_hex(),
            buyer_order_id: m.buyer.id.clone(),
            seller_order_id: m.seller.id.clone(),
            trade_amount: m.trade_amount,
            execution_price: m.execution_price,
        }
    }
}

/// Handler result, rendered to JSON with [`TriggerResponse::into_json`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<PendingReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub trade: Option<MatchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_error: Option<String>,
    /// Settlement response fields, merged into the top level.
    #[serde(skip)]
    pub settlement: Map<String, Value>,
}

impl TriggerResponse {
    fn bare(status: MatchStatus) -> Self {
        Self {
            status,
            order_id: None,
            reason: None,
            error: None,
            trade: None,
            settlement_error: None,
            settlement: Map::new(),
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::bare(MatchStatus::Failed)
        }
    }

    #[must_use]
    pub fn pending(order_id: OrderId) -> Self {
        Self {
            order_id: Some(order_id),
            ..Self::bare(MatchStatus::Pending)
        }
    }

    #[must_use]
    pub fn blocked(order_id: OrderId, reason: PendingReason) -> Self {
        Self {
            order_id: Some(order_id),
            reason: Some(reason),
            ..Self::bare(MatchStatus::Pending)
        }
    }

    #[must_use]
    pub fn matched(order_id: OrderId, trade: &MatchResult) -> Self {
        Self {
            order_id: Some(order_id),
            trade: Some(MatchSummary::from(trade)),
            ..Self::bare(MatchStatus::Matched)
        }
    }

    /// Render as a JSON object. Settlement fields are merged verbatim at the
    /// top level, except `status`, which always reflects this invocation.
    #[must_use]
    pub fn into_json(self) -> Value {
        let settlement = self.settlement.clone();
        let mut obj = match serde_json::to_value(&self) {
            Ok(Value::Object(obj)) => obj,
            _ => {
                let mut obj = Map::new();
                obj.insert("status".into(), Value::String("failed".into()));
                obj
            }
        };
        for (key, value) in settlement {
            if key != "status" {
                obj.insert(key, value);
            }
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_match_order_trigger() {
        let raw = json!({
            "action": "match_order",
            "orderId": "o-1",
            "pairId": "ETH-USDC",
            "encryptedOrder": "AAAA",
            "signature": "0xdead"
        });
        let req: TriggerRequest = serde_json::from_value(raw).unwrap();
        let trig = req.into_match_order().unwrap();
        assert_eq!(trig.order_id.as_str(), "o-1");
        assert_eq!(trig.pair_id.as_str(), "ETH-USDC");
        assert_eq!(trig.signature.as_deref(), Some("0xdead"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let req = TriggerRequest::from_slice(br#"{"action":"cancel_order"}"#).unwrap();
        let err = req.into_match_order().unwrap_err();
        assert!(matches!(err, VeilmatchError::UnknownAction(ref a) if a == "cancel_order"));
    }

    #[test]
    fn missing_envelope_is_invalid() {
        let req = TriggerRequest::from_slice(
            br#"{"action":"match_order","orderId":"o","pairId":"p"}"#,
        )
        .unwrap();
        assert!(matches!(
            req.into_match_order(),
            Err(VeilmatchError::InvalidTrigger { .. })
        ));
    }

    #[test]
    fn pending_json_shape() {
        let v = TriggerResponse::pending(OrderId::new("o-9")).into_json();
        assert_eq!(v, json!({"status": "pending", "orderId": "o-9"}));
    }

    #[test]
    fn blocked_json_shape() {
        let v = TriggerResponse::blocked(OrderId::new("o-9"), PendingReason::SellerNotVerified)
            .into_json();
        assert_eq!(
            v,
            json!({"status": "pending", "orderId": "o-9", "reason": "seller_not_verified"})
        );
    }

    #[test]
    fn failed_json_shape() {
        let v = TriggerResponse::failed("Decryption failed").into_json();
        assert_eq!(v, json!({"status": "failed", "error": "Decryption failed"}));
    }

    #[test]
    fn settlement_fields_merge_but_status_is_reserved() {
        let mut resp = TriggerResponse::pending(OrderId::new("o"));
        resp.status = MatchStatus::Matched;
        resp.settlement.insert("settlementId".into(), json!("s-1"));
        resp.settlement.insert("status".into(), json!("ok"));
        let v = resp.into_json();
        assert_eq!(v["status"], "matched");
        assert_eq!(v["settlementId"], "s-1");
    }
}
