//! Config file loading.
//!
//! The file is JSON matching [`EnclaveConfig`]; every section is optional
//! and falls back to its defaults. Secrets never come from the file.

use std::path::Path;

use tracing::info;
use veilmatch_types::{EnclaveConfig, EnclaveSecrets, Result, SettlementConfig, VeilmatchError};

/// Parse a JSON config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<EnclaveConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| VeilmatchError::Configuration(format!("{}: {e}", path.display())))?;
    parse_config(&raw)
}

/// Parse config JSON.
pub fn parse_config(raw: &str) -> Result<EnclaveConfig> {
    serde_json::from_str(raw).map_err(|e| VeilmatchError::Configuration(format!("invalid config: {e}")))
}

/// Load (or default) the config and check it against the available secrets.
pub fn load_validated(path: Option<&Path>, secrets: &EnclaveSecrets) -> Result<EnclaveConfig> {
    let config = match path {
        Some(p) => load_config(p)?,
        None => EnclaveConfig::default(),
    };
    config.validate(secrets)?;
    let settlement = match config.settlement {
        SettlementConfig::Http => "http",
        SettlementConfig::OnChain(_) => "on_chain",
    };
    info!(
        settlement,
        backend = config.backend.base_url.is_some(),
        registry = config.registry.registry_address.is_some(),
        gate_on_error = ?config.registry.gate_on_error,
        execution_price = ?config.execution_price,
        "Configuration loaded"
    );
    Ok(config)
}
