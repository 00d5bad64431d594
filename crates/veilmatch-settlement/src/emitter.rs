//! The settlement capability shared by every protocol.

use async_trait::async_trait;
use serde_json::{Map, Value};
use veilmatch_types::{MatchResult, Result};

/// Which settlement protocol an emitter speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementProtocol {
    /// Backend callback. A failure is reported but the match stands.
    Http,
    /// Signed report to a receiver contract. A failure fails the invocation.
    OnChainReport,
}

impl SettlementProtocol {
    /// Whether an emit error turns the whole invocation into `failed`.
    #[must_use]
    pub fn failure_is_fatal(self) -> bool {
        matches!(self, Self::OnChainReport)
    }
}

/// Publishes a gated match to the outside world.
///
/// Implementations are called at most once per match and must not retry.
#[async_trait]
pub trait SettlementEmitter: Send + Sync {
    fn protocol(&self) -> SettlementProtocol;

    /// Emit `trade`. The returned object is merged into the handler result.
    async fn emit(&self, trade: &MatchResult) -> Result<Map<String, Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_on_chain_failures_are_fatal() {
        assert!(!SettlementProtocol::Http.failure_is_fatal());
        assert!(SettlementProtocol::OnChainReport.failure_is_fatal());
    }
}
