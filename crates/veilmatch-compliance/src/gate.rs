//! Eligibility gate: decides whether a match may be settled.
//!
//! Only the persistent `owner_identity` of each side is checked. The
//! recipient address is a payout destination and never reaches the
//! registry.
//!
//! Policy:
//! - no registry configured: everyone passes
//! - registry answers: its answer stands
//! - registry unreachable or undecodable: [`GateOnError`] decides

use std::sync::Arc;

use alloy_primitives::Address;
use tracing::{info, warn};
use veilmatch_types::{GateOnError, MatchResult, PendingReason, RegistryConfig, Result};

use crate::{ComplianceRegistry, JsonRpcRegistry};

/// Outcome of gating one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Cleared,
    BuyerNotVerified,
    SellerNotVerified,
}

impl GateDecision {
    /// Pending reason to report, or `None` if the match is cleared.
    #[must_use]
    pub fn pending_reason(self) -> Option<PendingReason> {
        match self {
            Self::Cleared => None,
            Self::BuyerNotVerified => Some(PendingReason::BuyerNotVerified),
            Self::SellerNotVerified => Some(PendingReason::SellerNotVerified),
        }
    }
}

/// Registry lookup plus error policy.
#[derive(Clone)]
pub struct EligibilityGate {
    registry: Option<Arc<dyn ComplianceRegistry>>,
    on_error: GateOnError,
}

impl EligibilityGate {
    #[must_use]
    pub fn new(registry: Option<Arc<dyn ComplianceRegistry>>, on_error: GateOnError) -> Self {
        Self { registry, on_error }
    }

    /// A gate with no registry: every identity passes.
    #[must_use]
    pub fn open() -> Self {
        Self::new(None, GateOnError::Open)
    }

    /// Build the JSON-RPC backed gate described by `config`.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let registry = JsonRpcRegistry::from_config(config)?
            .map(|r| Arc::new(r) as Arc<dyn ComplianceRegistry>);
        if registry.is_none() {
            warn!("No compliance registry configured, eligibility gate passes everyone");
        }
        Ok(Self::new(registry, config.gate_on_error))
    }

    /// `true` if a registry is attached.
    #[must_use]
    pub fn is_enforcing(&self) -> bool {
        self.registry.is_some()
    }

    /// Whether `identity` may take part in a settlement.
    pub async fn is_eligible(&self, identity: Address) -> bool {
        let Some(registry) = &self.registry else {
            return true;
        };
        match registry.is_verified(identity).await {
            Ok(verified) => verified,
            Err(e) => {
                let allowed = self.on_error == GateOnError::Open;
                warn!(error = %e, allowed, "Eligibility check failed, applying gate policy");
                allowed
            }
        }
    }

    /// Check buyer, then seller. The seller is not looked up if the buyer
    /// is rejected.
    pub async fn check_match(&self, trade: &MatchResult) -> GateDecision {
        let decision = if !self.is_eligible(trade.buyer.owner_identity).await {
            GateDecision::BuyerNotVerified
        } else if !self.is_eligible(trade.seller.owner_identity).await {
            GateDecision::SellerNotVerified
        } else {
            GateDecision::Cleared
        };

        info!(
            match_id = %trade.match_id,
            buyer = %trade.buyer.id,
            seller = %trade.seller.id,
            decision = ?decision,
            "Eligibility gate"
        );
        decision
    }
}

impl std::fmt::Debug for EligibilityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EligibilityGate")
            .field("enforcing", &self.is_enforcing())
            .field("on_error", &self.on_error)
            .finish()
    }
}
