//! # veilmatch-ingress
//!
//! **Security Envelope Plane**: everything that turns ciphertext into a
//! validated order inside the enclave.
//!
//! ## Architecture
//!
//! 1. **Envelope**: parses the flat `pubkey ‖ nonce ‖ ciphertext‖tag` wire format
//! 2. **ECIES codec**: secp256k1 ECDH → SHA-256 → AES-256-GCM
//! 3. **Decoder**: JSON plaintext → [`Order`](veilmatch_types::Order), with the
//!    trusted id overwrite
//! 4. **Resting**: opens the resting snapshot, skipping bad entries one by one
//!
//! ## Order Flow
//!
//! ```text
//! base64 → Envelope::from_base64() → EnclaveKey::decrypt() → decode_order()
//!        → Order (id = trigger orderId)
//! ```
//!
//! Plaintext never leaves this process: nothing here logs order fields.

pub mod decoder;
pub mod ecies;
pub mod envelope;
pub mod resting;

pub use decoder::{decode_order, encode_order, open_order, seal_order};
pub use ecies::{EnclaveKey, decrypt, encrypt};
pub use envelope::Envelope;
pub use resting::{OpenedBook, open_resting_orders};
