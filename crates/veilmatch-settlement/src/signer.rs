//! Report signing capability.

use alloy_primitives::{Address, keccak256};
use async_trait::async_trait;
use k256::ecdsa::{SigningKey, VerifyingKey};
use veilmatch_types::{Result, VeilmatchError};

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// Signs encoded reports before submission.
#[async_trait]
pub trait ReportSigner: Send + Sync {
    /// Address the receiver contract should recover.
    fn signer_address(&self) -> Address;

    async fn sign_report(&self, report: &[u8]) -> Result<Vec<u8>>;
}

/// secp256k1 key held in process memory.
///
/// Signs `keccak256(report)` and returns `r || s || v` with `v` in `{27, 28}`.
pub struct LocalKeyReportSigner {
    key: SigningKey,
    address: Address,
}

impl LocalKeyReportSigner {
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim().trim_start_matches("0x")).map_err(|_| {
            VeilmatchError::Configuration("report signing key is not valid hex".into())
        })?;
        let key = SigningKey::from_slice(&bytes).map_err(|_| {
            VeilmatchError::Configuration("report signing key is not a valid scalar".into())
        })?;
        Ok(Self::new(key))
    }
}

/// Ethereum address of a secp256k1 public key.
#[must_use]
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    Address::from_slice(&keccak256(&point.as_bytes()[1..])[12..])
}

#[async_trait]
impl ReportSigner for LocalKeyReportSigner {
    fn signer_address(&self) -> Address {
        self.address
    }

    async fn sign_report(&self, report: &[u8]) -> Result<Vec<u8>> {
        let digest = keccak256(report);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|e| VeilmatchError::ReportSigning {
                reason: e.to_string(),
            })?;
        let mut out = Vec::with_capacity(SIGNATURE_LEN);
        out.extend_from_slice(&signature.to_bytes());
        out.push(27 + recovery_id.to_byte());
        Ok(out)
    }
}

impl std::fmt::Debug for LocalKeyReportSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyReportSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
