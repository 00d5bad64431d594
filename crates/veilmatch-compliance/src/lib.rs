//! # veilmatch-compliance
//!
//! **Eligibility Plane**: decides whether a found match may be settled.
//!
//! - [`ComplianceRegistry`]: read-only `isVerified(address)` capability
//! - [`JsonRpcRegistry`]: the capability over an `eth_call` to a registry contract
//! - [`EligibilityGate`]: registry lookup plus the `gate_on_error` policy
//! - [`rpc`]: the JSON-RPC client shared with on-chain settlement
//!
//! The gate only ever sees owner identities. It never logs them.

pub mod gate;
pub mod registry;
pub mod rpc;

pub use gate::{EligibilityGate, GateDecision};
pub use registry::{ComplianceRegistry, JsonRpcRegistry, decode_is_verified, encode_is_verified};
pub use rpc::{JsonRpcClient, RpcError, TxReceipt};
