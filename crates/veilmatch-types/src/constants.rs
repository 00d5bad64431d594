//! System-wide constants for the VeilMatch matching core.

/// Compressed SEC1 secp256k1 public key length.
pub const EPHEMERAL_PUBKEY_LEN: usize = 33;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length (appended to the ciphertext).
pub const TAG_LEN: usize = 16;

/// Smallest possible envelope: key, nonce, and a tag over an empty plaintext.
pub const MIN_ENVELOPE_LEN: usize = EPHEMERAL_PUBKEY_LEN + NONCE_LEN + TAG_LEN;

/// The only trigger action this core handles.
pub const ACTION_MATCH_ORDER: &str = "match_order";

/// Report type tag for a verification-only report.
pub const REPORT_TYPE_VERIFICATION: u8 = 0;

/// Report type tag for a settlement report.
pub const REPORT_TYPE_SETTLEMENT: u8 = 1;

/// Default path for the resting-order query on the backend.
pub const DEFAULT_ORDERS_PATH: &str = "/orders/encrypted";

/// Default path for the HTTP settlement callback.
pub const DEFAULT_SETTLE_PATH: &str = "/settle";

/// Default header carrying the settlement shared secret.
pub const DEFAULT_SECRET_HEADER: &str = "x-settlement-secret";

/// Default per-request HTTP timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default chain selector for registry reads and report submission.
pub const DEFAULT_CHAIN_SELECTOR: &str = "ethereum-testnet-sepolia";

/// Default gas limit for report submission.
pub const DEFAULT_REPORT_GAS_LIMIT: u64 = 500_000;

/// Default number of receipt polls before a report is considered unconfirmed.
pub const DEFAULT_RECEIPT_POLL_ATTEMPTS: u32 = 20;

/// Default delay between receipt polls in milliseconds.
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

/// Environment variable holding the enclave's hex-encoded decryption key.
pub const ENV_ENCLAVE_KEY: &str = "VEILMATCH_ENCLAVE_KEY";

/// Environment variable holding the HTTP settlement shared secret.
pub const ENV_SETTLEMENT_SECRET: &str = "VEILMATCH_SETTLEMENT_SECRET";

/// Environment variable holding the hex-encoded report signing key.
pub const ENV_REPORT_KEY: &str = "VEILMATCH_REPORT_KEY";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "VeilMatch";
