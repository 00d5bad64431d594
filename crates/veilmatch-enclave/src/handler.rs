//! Trigger handler: one invocation, one incoming order, at most one match.
//!
//! ```text
//! RECEIVED -> DECRYPTED -> BOOK_FETCHED -> MATCHED | NO_MATCH
//!          -> GATED | GATE_FAILED -> SETTLED | SETTLEMENT_FAILED
//! ```
//!
//! | step            | failure                     | result                                  |
//! |-----------------|-----------------------------|-----------------------------------------|
//! | parse trigger   | bad JSON, unknown action    | `failed` with the error                 |
//! | decrypt/decode  | any                         | `failed`, `"Decryption failed"`         |
//! | fetch book      | any                         | continue with an empty book             |
//! | open entries    | per entry                   | entry skipped                           |
//! | match           | no crossing order           | `pending`                               |
//! | gate            | party not verified          | `pending` + reason, emitter not called  |
//! | settle (HTTP)   | transport / non-2xx         | `matched` + `settlementError`           |
//! | settle (chain)  | any                         | `failed`                                |
//!
//! The handler never returns an error: every outcome is a JSON object with a
//! `status`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use veilmatch_compliance::EligibilityGate;
use veilmatch_ingress::{EnclaveKey, open_order, open_resting_orders};
use veilmatch_matchcore::find_counterparty;
use veilmatch_settlement::SettlementEmitter;
use veilmatch_types::{
    ExecutionPricePolicy, MatchOrderTrigger, Order, Result, TriggerRequest, TriggerResponse,
    VeilmatchError,
};

use crate::source::RestingOrderSource;

/// Public error text for any ingress failure. Deliberately uninformative.
pub const DECRYPTION_FAILED: &str = "Decryption failed";

/// Everything one invocation needs, wired once per process.
pub struct TriggerHandler {
    key: EnclaveKey,
    source: Arc<dyn RestingOrderSource>,
    gate: EligibilityGate,
    emitter: Arc<dyn SettlementEmitter>,
    execution_price: ExecutionPricePolicy,
}

impl TriggerHandler {
    pub fn new(
        key: EnclaveKey,
        source: Arc<dyn RestingOrderSource>,
        gate: EligibilityGate,
        emitter: Arc<dyn SettlementEmitter>,
        execution_price: ExecutionPricePolicy,
    ) -> Self {
        Self {
            key,
            source,
            gate,
            emitter,
            execution_price,
        }
    }

    /// Compressed public key order submitters encrypt to.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        self.key.public_key_hex()
    }

    pub(crate) fn enclave_key(&self) -> &EnclaveKey {
        &self.key
    }

    /// Handle a raw trigger payload and render the JSON result.
    pub async fn handle(&self, payload: &[u8]) -> Value {
        let response = match TriggerRequest::from_slice(payload) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => trigger_error(&e),
        };
        response.into_json()
    }

    /// Dispatch on the trigger action.
    pub async fn handle_request(&self, request: TriggerRequest) -> TriggerResponse {
        match request.into_match_order() {
            Ok(trigger) => self.match_order(trigger).await,
            Err(e) => trigger_error(&e),
        }
    }

    /// Run the `match_order` workflow.
    pub async fn match_order(&self, trigger: MatchOrderTrigger) -> TriggerResponse {
        // RECEIVED -> DECRYPTED
        let order = match self.open_incoming(&trigger) {
            Ok(order) => order,
            Err(e) => {
                warn!(order_id = %trigger.order_id, code = %error_code(&e), "Incoming order rejected");
                return TriggerResponse::failed(DECRYPTION_FAILED);
            }
        };
        debug!(order_id = %order.id, pair = %order.pair_id, "Order decrypted");

        // DECRYPTED -> BOOK_FETCHED
        let entries = match self.source.fetch_resting(&order.pair_id).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(pair = %order.pair_id, error = %e, "Resting order fetch failed, using empty book");
                Vec::new()
            }
        };
        let book = open_resting_orders(&entries, &self.key, &order.id, &order.pair_id);

        // BOOK_FETCHED -> MATCHED | NO_MATCH
        let Some(trade) = find_counterparty(&order, &book.orders, self.execution_price) else {
            info!(order_id = %order.id, resting = book.orders.len(), "No match, order pending");
            return TriggerResponse::pending(order.id);
        };
        let counterparty = trade.maker_order_id();
        info!(order_id = %order.id, match_id = %trade.match_id, %counterparty, "Counterparty found");

        // MATCHED -> GATED | GATE_FAILED
        if let Some(reason) = self.gate.check_match(&trade).await.pending_reason() {
            info!(order_id = %order.id, match_id = %trade.match_id, ?reason, "Match held by eligibility gate");
            return TriggerResponse::blocked(order.id, reason);
        }

        // GATED -> SETTLED | SETTLEMENT_FAILED
        let protocol = self.emitter.protocol();
        match self.emitter.emit(&trade).await {
            Ok(settlement) => {
                info!(order_id = %order.id, match_id = %trade.match_id, ?protocol, "Match settled");
                let mut response = TriggerResponse::matched(order.id, &trade);
                response.settlement = settlement;
                response
            }
            Err(e) if protocol.failure_is_fatal() => {
                warn!(order_id = %order.id, match_id = %trade.match_id, error = %e, "Settlement failed");
                let mut response = TriggerResponse::failed(format!("Settlement failed: {e}"));
                response.order_id = Some(order.id);
                response
            }
            Err(e) => {
                warn!(order_id = %order.id, match_id = %trade.match_id, error = %e, "Settlement callback failed, match stands");
                let mut response = TriggerResponse::matched(order.id, &trade);
                response.settlement_error = Some(e.to_string());
                response
            }
        }
    }

    fn open_incoming(&self, trigger: &MatchOrderTrigger) -> Result<Order> {
        let order = open_order(&trigger.encrypted_order, &self.key, &trigger.order_id)?;
        if order.pair_id != trigger.pair_id {
            return Err(VeilmatchError::MalformedOrder {
                reason: "pair does not match trigger".into(),
            });
        }
        Ok(order)
    }
}

impl std::fmt::Debug for TriggerHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerHandler")
            .field("gate", &self.gate)
            .field("protocol", &self.emitter.protocol())
            .field("execution_price", &self.execution_price)
            .finish_non_exhaustive()
    }
}

fn trigger_error(err: &VeilmatchError) -> TriggerResponse {
    warn!(code = %error_code(err), "Trigger rejected");
    match err {
        VeilmatchError::UnknownAction(action) => {
            TriggerResponse::failed(format!("Unknown action: {action}"))
        }
        VeilmatchError::InvalidTrigger { reason } => {
            TriggerResponse::failed(format!("Invalid trigger: {reason}"))
        }
        other => TriggerResponse::failed(other.to_string()),
    }
}

/// `VM_ERR_nnn` prefix of an error's message, for logs that must not carry
/// the rest of it.
fn error_code(err: &VeilmatchError) -> String {
    err.to_string()
        .split(':')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_is_the_prefix() {
        let err = VeilmatchError::Decryption {
            reason: "authentication failed",
        };
        assert_eq!(error_code(&err), "VM_ERR_100");
    }

    #[test]
    fn unknown_action_message() {
        let v = trigger_error(&VeilmatchError::UnknownAction("cancel".into())).into_json();
        assert_eq!(v["error"], "Unknown action: cancel");
        assert_eq!(v["status"], "failed");
    }

    #[test]
    fn invalid_trigger_message() {
        let v = trigger_error(&VeilmatchError::InvalidTrigger {
            reason: "missing orderId".into(),
        })
        .into_json();
        assert_eq!(v["error"], "Invalid trigger: missing orderId");
    }
}
