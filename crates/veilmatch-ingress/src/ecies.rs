//! ECIES over secp256k1 with AES-256-GCM.
//!
//! ## Key derivation
//!
//! ```text
//! shared = ECDH(recipient_secret, ephemeral_public)     // secp256k1 point
//! key    = SHA-256(shared.x)                             // 32 bytes
//! plain  = AES-256-GCM-Open(key, nonce, ciphertext‖tag)
//! ```
//!
//! The codec holds no state between calls: decrypting the same envelope twice
//! with the same key yields identical plaintext. Tag verification is constant
//! time inside `aes-gcm`; every authentication failure maps to the same
//! error so callers cannot learn where it failed.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use k256::{
    PublicKey, SecretKey,
    ecdh::{EphemeralSecret, diffie_hellman},
    elliptic_curve::sec1::ToEncodedPoint,
};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use veilmatch_types::{
    Result, VeilmatchError,
    constants::{EPHEMERAL_PUBKEY_LEN, NONCE_LEN},
};

use crate::envelope::Envelope;

/// The enclave's static decryption key.
#[derive(Clone)]
pub struct EnclaveKey {
    secret: SecretKey,
}

impl EnclaveKey {
    /// Parse a hex-encoded 32-byte scalar (with or without `0x`).
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let trimmed = hex_key.trim();
        let raw = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(raw).map_err(|_| VeilmatchError::Decryption {
            reason: "private key is not valid hex",
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse a raw 32-byte scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(VeilmatchError::Decryption {
                reason: "invalid private key length",
            });
        }
        let secret = SecretKey::from_slice(bytes).map_err(|_| VeilmatchError::Decryption {
            reason: "invalid private key",
        })?;
        Ok(Self { secret })
    }

    /// Fresh random key (tests and key provisioning).
    #[must_use]
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    /// Compressed SEC1 public key, hex-encoded, for publishing to producers.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().to_encoded_point(true).as_bytes())
    }

    pub fn decrypt(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        decrypt(envelope, &self.secret)
    }
}

impl std::fmt::Debug for EnclaveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnclaveKey")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// SHA-256 of the shared point's x-coordinate.
fn derive_symmetric_key(shared_x: &[u8]) -> [u8; 32] {
    Sha256::digest(shared_x).into()
}

/// Open an envelope with the recipient's static key.
pub fn decrypt(envelope: &Envelope, recipient: &SecretKey) -> Result<Vec<u8>> {
    let ephemeral = PublicKey::from_sec1_bytes(&envelope.ephemeral_public_key).map_err(|_| {
        VeilmatchError::Decryption {
            reason: "invalid ephemeral public key",
        }
    })?;

    let shared = diffie_hellman(recipient.to_nonzero_scalar(), ephemeral.as_affine());
    let key = derive_symmetric_key(shared.raw_secret_bytes());

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| VeilmatchError::Decryption {
        reason: "invalid symmetric key length",
    })?;
    cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
        .map_err(|_| VeilmatchError::Decryption {
            reason: "authentication failed",
        })
}

/// Seal a plaintext for `recipient` with a fresh ephemeral key and nonce.
pub fn encrypt(plaintext: &[u8], recipient: &PublicKey) -> Result<Envelope> {
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let shared = ephemeral.diffie_hellman(recipient);
    let key = derive_symmetric_key(shared.raw_secret_bytes());

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| VeilmatchError::Internal("invalid symmetric key length".into()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| VeilmatchError::Internal("AES-GCM encryption failed".into()))?;

    let encoded = ephemeral.public_key().to_encoded_point(true);
    let ephemeral_public_key: [u8; EPHEMERAL_PUBKEY_LEN] = encoded
        .as_bytes()
        .try_into()
        .map_err(|_| VeilmatchError::Internal("unexpected compressed key length".into()))?;

    Ok(Envelope {
        ephemeral_public_key,
        nonce,
        ciphertext,
    })
}
