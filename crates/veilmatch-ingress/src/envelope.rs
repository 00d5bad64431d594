//! ECIES envelope wire format.
//!
//! ```text
//! ┌──────────────────────────┬──────────────┬───────────────────────────────┐
//! │ ephemeral pubkey (33 B)  │ nonce (12 B) │ ciphertext ‖ GCM tag (16 B)   │
//! │ compressed SEC1          │              │                               │
//! └──────────────────────────┴──────────────┴───────────────────────────────┘
//! ```
//!
//! The layout is shared with external producers and must not change. For
//! transport the bytes are base64-encoded (standard alphabet, padded).

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use veilmatch_types::{
    Result, VeilmatchError,
    constants::{EPHEMERAL_PUBKEY_LEN, MIN_ENVELOPE_LEN, NONCE_LEN},
};

/// A parsed, still-encrypted order payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub ephemeral_public_key: [u8; EPHEMERAL_PUBKEY_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// AES-GCM ciphertext with the 16-byte tag appended.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Split the flat wire bytes into their three parts.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(VeilmatchError::Decryption {
                reason: "envelope truncated",
            });
        }
        let (key, rest) = bytes.split_at(EPHEMERAL_PUBKEY_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let mut ephemeral_public_key = [0u8; EPHEMERAL_PUBKEY_LEN];
        ephemeral_public_key.copy_from_slice(key);
        let mut nonce_arr = [0u8; NONCE_LEN];
        nonce_arr.copy_from_slice(nonce);

        Ok(Self {
            ephemeral_public_key,
            nonce: nonce_arr,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Concatenate back into wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(EPHEMERAL_PUBKEY_LEN + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.ephemeral_public_key);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Decode a base64 transport string.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| VeilmatchError::Decryption {
                reason: "envelope is not valid base64",
            })?;
        Self::from_bytes(&bytes)
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }
}
