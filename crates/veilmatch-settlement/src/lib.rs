//! # veilmatch-settlement
//!
//! **Finality Plane**: publishes a gated
//! [`MatchResult`](veilmatch_types::MatchResult) to the outside world.
//!
//! ## Protocols
//!
//! Both sit behind [`SettlementEmitter`] and are chosen by configuration:
//!
//! - **HTTP** ([`HttpSettlementEmitter`]): POST to the backend's settle
//!   endpoint with a shared-secret header. Failure is reported, the match stands.
//! - **On-chain report** ([`OnChainReportEmitter`]): stealth addresses, ABI
//!   report, signature by a [`ReportSigner`], submission by a [`ReportWriter`].
//!   Failure fails the invocation.
//!
//! Neither protocol retries.

use std::sync::Arc;
use std::time::Duration;

use veilmatch_types::{EnclaveConfig, EnclaveSecrets, Result, SettlementConfig, VeilmatchError};

pub mod emitter;
pub mod http;
pub mod onchain;
pub mod report;
pub mod signer;
pub mod stealth;
pub mod writer;

pub use emitter::{SettlementEmitter, SettlementProtocol};
pub use http::{HttpSettlementEmitter, SettleRequest};
pub use onchain::OnChainReportEmitter;
pub use report::{SettlementReport, VerificationReport, scale_amount};
pub use signer::{LocalKeyReportSigner, ReportSigner};
pub use stealth::stealth_address;
pub use writer::{JsonRpcReportWriter, ReportWriter, WriteReceipt};

/// Build the emitter selected by `config.settlement`.
pub fn emitter_from_config(
    config: &EnclaveConfig,
    secrets: &EnclaveSecrets,
) -> Result<Arc<dyn SettlementEmitter>> {
    match &config.settlement {
        SettlementConfig::Http => {
            let secret = secrets.settlement_secret.as_deref().ok_or_else(|| {
                VeilmatchError::Configuration("HTTP settlement requires a shared secret".into())
            })?;
            Ok(Arc::new(HttpSettlementEmitter::from_config(&config.backend, secret)?))
        }
        SettlementConfig::OnChain(on_chain) => {
            let key = secrets.report_key_hex.as_deref().ok_or_else(|| {
                VeilmatchError::Configuration("on-chain settlement requires a report key".into())
            })?;
            let rpc_url = config
                .registry
                .rpc_urls
                .get(&on_chain.chain_selector)
                .ok_or_else(|| {
                    VeilmatchError::Configuration(format!(
                        "no RPC URL for settlement chain {}",
                        on_chain.chain_selector
                    ))
                })?;
            Ok(Arc::new(OnChainReportEmitter::from_config(
                on_chain,
                rpc_url,
                key,
                Duration::from_millis(config.backend.request_timeout_ms),
            )?))
        }
    }
}
