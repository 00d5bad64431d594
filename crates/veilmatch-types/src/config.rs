//! Configuration types for the enclave matching workflow.
//!
//! Everything here is safe to keep in a config file. Key material lives in
//! [`EnclaveSecrets`], which is read from the environment and never
//! serialized.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{Result, VeilmatchError, constants};

/// Top-level configuration for one enclave workflow deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnclaveConfig {
    /// Untrusted backend: resting-order source and HTTP settlement target.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Compliance registry used by the eligibility gate.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Which settlement protocol to emit.
    #[serde(default)]
    pub settlement: SettlementConfig,
    /// How the execution price of a match is chosen.
    #[serde(default)]
    pub execution_price: ExecutionPricePolicy,
}

impl EnclaveConfig {
    /// Cross-field checks that serde cannot express.
    pub fn validate(&self, secrets: &EnclaveSecrets) -> Result<()> {
        if let SettlementConfig::OnChain(on_chain) = &self.settlement {
            if secrets.report_key_hex.is_none() {
                return Err(VeilmatchError::Configuration(format!(
                    "on-chain settlement requires {}",
                    constants::ENV_REPORT_KEY
                )));
            }
            if on_chain.pairs.is_empty() {
                return Err(VeilmatchError::Configuration(
                    "on-chain settlement requires at least one pair token mapping".into(),
                ));
            }
            if !self.registry.rpc_urls.contains_key(&on_chain.chain_selector) {
                return Err(VeilmatchError::Configuration(format!(
                    "no RPC URL for settlement chain {}",
                    on_chain.chain_selector
                )));
            }
        }
        if matches!(self.settlement, SettlementConfig::Http) {
            if self.backend.base_url.is_none() {
                return Err(VeilmatchError::Configuration(
                    "HTTP settlement requires backend.base_url".into(),
                ));
            }
            if secrets.settlement_secret.is_none() {
                return Err(VeilmatchError::Configuration(format!(
                    "HTTP settlement requires {}",
                    constants::ENV_SETTLEMENT_SECRET
                )));
            }
        }
        Ok(())
    }
}

/// Backend endpoints (resting orders and HTTP settlement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://api.example.com`. `None` means no backend:
    /// the runner keeps resting orders in memory.
    pub base_url: Option<String>,
    #[serde(default = "default_orders_path")]
    pub orders_path: String,
    #[serde(default = "default_settle_path")]
    pub settle_path: String,
    /// Header carrying the shared settlement secret.
    #[serde(default = "default_secret_header")]
    pub secret_header: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_orders_path() -> String {
    constants::DEFAULT_ORDERS_PATH.to_string()
}

fn default_settle_path() -> String {
    constants::DEFAULT_SETTLE_PATH.to_string()
}

fn default_secret_header() -> String {
    constants::DEFAULT_SECRET_HEADER.to_string()
}

fn default_request_timeout_ms() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_chain_selector() -> String {
    constants::DEFAULT_CHAIN_SELECTOR.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            orders_path: default_orders_path(),
            settle_path: default_settle_path(),
            secret_header: default_secret_header(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// What the eligibility gate does when it cannot complete a registry read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOnError {
    /// Treat the party as eligible (availability first).
    #[default]
    Open,
    /// Treat the party as not eligible.
    Closed,
}

/// Compliance registry location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Chain the registry lives on; looked up in `rpc_urls`.
    #[serde(default = "default_chain_selector")]
    pub chain_selector: String,
    /// `None` disables the gate: every party passes.
    #[serde(default)]
    pub registry_address: Option<Address>,
    /// JSON-RPC endpoints keyed by chain selector.
    #[serde(default)]
    pub rpc_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub gate_on_error: GateOnError,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            chain_selector: default_chain_selector(),
            registry_address: None,
            rpc_urls: BTreeMap::new(),
            gate_on_error: GateOnError::Open,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Settlement protocol selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SettlementConfig {
    /// POST the match to the backend's settle endpoint.
    #[default]
    Http,
    /// Sign an ABI-encoded report and submit it to a receiver contract.
    OnChain(OnChainConfig),
}

/// On-chain report settlement parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnChainConfig {
    #[serde(default = "default_chain_selector")]
    pub chain_selector: String,
    /// Contract exposing `submitReport(bytes,bytes)`.
    pub receiver_address: Address,
    /// Node-managed account that sends the report transaction.
    pub sender_address: Address,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_receipt_poll_attempts")]
    pub receipt_poll_attempts: u32,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    /// Token addresses and decimals, keyed by pair id.
    pub pairs: BTreeMap<String, PairTokens>,
}

fn default_gas_limit() -> u64 {
    constants::DEFAULT_REPORT_GAS_LIMIT
}

fn default_receipt_poll_attempts() -> u32 {
    constants::DEFAULT_RECEIPT_POLL_ATTEMPTS
}

fn default_receipt_poll_interval_ms() -> u64 {
    constants::DEFAULT_RECEIPT_POLL_INTERVAL_MS
}

/// Token contracts for one pair. Base is `tokenA`, quote is `tokenB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairTokens {
    pub base_token: Address,
    pub quote_token: Address,
    pub base_decimals: u8,
    pub quote_decimals: u8,
}

/// Which order's limit price a match executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPricePolicy {
    /// The SELL order's price: the resting SELL for an incoming BUY, the
    /// incoming SELL's own price otherwise.
    #[default]
    SellerPrice,
    /// Always the resting (passive) order's price.
    Resting,
}

/// Key material and shared secrets. Read from the environment, never from
/// the config file.
#[derive(Clone)]
pub struct EnclaveSecrets {
    /// Hex-encoded secp256k1 scalar used to decrypt order envelopes.
    pub enclave_key_hex: String,
    pub settlement_secret: Option<String>,
    /// Hex-encoded secp256k1 scalar used to sign on-chain reports.
    pub report_key_hex: Option<String>,
}

impl EnclaveSecrets {
    /// Build from an arbitrary variable lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let enclave_key_hex = lookup(constants::ENV_ENCLAVE_KEY)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                VeilmatchError::Configuration(format!("{} is not set", constants::ENV_ENCLAVE_KEY))
            })?;
        Ok(Self {
            enclave_key_hex,
            settlement_secret: lookup(constants::ENV_SETTLEMENT_SECRET)
                .filter(|v| !v.is_empty()),
            report_key_hex: lookup(constants::ENV_REPORT_KEY).filter(|v| !v.is_empty()),
        })
    }

    /// Read from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

impl std::fmt::Debug for EnclaveSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnclaveSecrets")
            .field("enclave_key_hex", &"<redacted>")
            .field(
                "settlement_secret",
                &self.settlement_secret.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "report_key_hex",
                &self.report_key_hex.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
