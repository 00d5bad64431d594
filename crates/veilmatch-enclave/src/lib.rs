//! # veilmatch-enclave
//!
//! **Workflow Plane**: wires ingress, MatchCore, the eligibility gate, and
//! settlement into a single trigger handler.
//!
//! - [`TriggerHandler`]: one `match_order` invocation, always a JSON result
//! - [`RestingOrderSource`]: the externally owned order pool
//!   ([`HttpRestingOrderSource`] or [`MemoryOrderStore`])
//! - [`ReplayRunner`]: newline-delimited triggers in, results out
//! - [`config`] / [`logging`]: process setup for the runner binary

use std::sync::Arc;

use veilmatch_compliance::EligibilityGate;
use veilmatch_ingress::EnclaveKey;
use veilmatch_settlement::emitter_from_config;
use veilmatch_types::{EnclaveConfig, EnclaveSecrets, Result};

pub mod config;
pub mod handler;
pub mod logging;
pub mod runner;
pub mod source;

pub use handler::{DECRYPTION_FAILED, TriggerHandler};
pub use runner::ReplayRunner;
pub use source::{HttpRestingOrderSource, MemoryOrderStore, RestingOrderSource};

/// Wire the handler described by `config`, reading resting orders from
/// `source`.
pub fn build_handler(
    config: &EnclaveConfig,
    secrets: &EnclaveSecrets,
    source: Arc<dyn RestingOrderSource>,
) -> Result<TriggerHandler> {
    let key = EnclaveKey::from_hex(&secrets.enclave_key_hex)?;
    let gate = EligibilityGate::from_config(&config.registry)?;
    let emitter = emitter_from_config(config, secrets)?;
    Ok(TriggerHandler::new(
        key,
        source,
        gate,
        emitter,
        config.execution_price,
    ))
}
