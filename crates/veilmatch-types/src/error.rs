//! Error types for the VeilMatch confidential matching core.
//!
//! All errors use the `VM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Ingress errors (envelope, decryption, decoding, trigger)
//! - 2xx: Resting-order book errors
//! - 3xx: Matching errors
//! - 4xx: Compliance / eligibility errors
//! - 5xx: Settlement errors
//! - 9xx: General / internal errors
//!
//! Messages never carry key material or decrypted order fields.

use thiserror::Error;

use crate::OrderId;

/// Central error enum for all VeilMatch operations.
#[derive(Debug, Error)]
pub enum VeilmatchError {
    // =================================================================
    // Ingress Errors (1xx)
    // =================================================================
    /// Envelope malformed, key invalid, or AEAD authentication failed.
    #[error("VM_ERR_100: Decryption failed: {reason}")]
    Decryption { reason: &'static str },

    /// Decrypted payload does not have the expected order shape.
    #[error("VM_ERR_101: Malformed order: {reason}")]
    MalformedOrder { reason: String },

    /// The trigger payload could not be parsed.
    #[error("VM_ERR_102: Invalid trigger: {reason}")]
    InvalidTrigger { reason: String },

    /// The trigger named an action this core does not handle.
    #[error("VM_ERR_103: Unknown action: {0}")]
    UnknownAction(String),

    // =================================================================
    // Book Errors (2xx)
    // =================================================================
    /// The resting-order source could not be reached or decoded.
    #[error("VM_ERR_200: Resting order fetch failed: {reason}")]
    BookFetch { reason: String },

    /// A single resting order could not be decrypted or decoded.
    #[error("VM_ERR_201: Resting order {id} skipped: {reason}")]
    RestingOrderSkipped { id: OrderId, reason: String },

    // =================================================================
    // Matching Errors (3xx)
    // =================================================================
    /// Decimal arithmetic overflowed.
    #[error("VM_ERR_300: Amount overflow: {reason}")]
    AmountOverflow { reason: String },

    // =================================================================
    // Compliance Errors (4xx)
    // =================================================================
    /// The registry call failed or its response could not be decoded.
    #[error("VM_ERR_400: Eligibility check failed: {reason}")]
    EligibilityCheck { reason: String },

    // =================================================================
    // Settlement Errors (5xx)
    // =================================================================
    /// The HTTP settlement callback failed (network error or non-2xx).
    #[error("VM_ERR_500: Settlement transport failed: {reason}")]
    SettlementTransport { reason: String },

    /// The on-chain settlement transaction reverted or was never confirmed.
    #[error("VM_ERR_501: On-chain settlement rejected: {reason}")]
    OnChainRejected { reason: String },

    /// Report could not be built (unknown pair, non-representable amount).
    #[error("VM_ERR_502: Report encoding failed: {reason}")]
    ReportEncoding { reason: String },

    /// The report signer could not produce a signature.
    #[error("VM_ERR_503: Report signing failed: {reason}")]
    ReportSigning { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("VM_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("VM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing secrets, etc.).
    #[error("VM_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, stdin/stdout).
    #[error("VM_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, VeilmatchError>;

impl From<std::io::Error> for VeilmatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VeilmatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
