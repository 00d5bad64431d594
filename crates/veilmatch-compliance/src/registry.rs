//! Compliance registry capability and its on-chain implementation.

use std::time::Duration;

use alloy_primitives::Address;
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use tracing::debug;
use veilmatch_types::{RegistryConfig, Result, VeilmatchError};

use crate::rpc::JsonRpcClient;

sol! {
    /// Identity registry consulted before any settlement.
    interface IComplianceRegistry {
        function isVerified(address account) external view returns (bool);
    }
}

/// Read-only view of an identity registry.
#[async_trait]
pub trait ComplianceRegistry: Send + Sync {
    /// Whether `identity` is verified. Errors mean the answer is unknown.
    async fn is_verified(&self, identity: Address) -> Result<bool>;
}

/// ABI calldata for `isVerified(identity)`.
#[must_use]
pub fn encode_is_verified(identity: Address) -> Vec<u8> {
    IComplianceRegistry::isVerifiedCall { account: identity }.abi_encode()
}

/// Decode the `bool` returned by `isVerified`.
pub fn decode_is_verified(data: &[u8]) -> Result<bool> {
    IComplianceRegistry::isVerifiedCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(|e| VeilmatchError::EligibilityCheck {
            reason: format!("cannot decode isVerified result: {e}"),
        })
}

/// `isVerified` over JSON-RPC `eth_call`.
#[derive(Debug)]
pub struct JsonRpcRegistry {
    registry_address: Address,
    chain_selector: String,
    /// `None` when no RPC URL is configured for the chain selector; every
    /// lookup then fails and the gate's error policy applies.
    rpc: Option<JsonRpcClient>,
}

impl JsonRpcRegistry {
    /// Build from config. Returns `Ok(None)` when no registry address is set.
    pub fn from_config(config: &RegistryConfig) -> Result<Option<Self>> {
        let Some(registry_address) = config.registry_address else {
            return Ok(None);
        };
        let rpc = config
            .rpc_urls
            .get(&config.chain_selector)
            .map(|url| {
                JsonRpcClient::new(url.clone(), Duration::from_millis(config.request_timeout_ms))
            })
            .transpose()
            .map_err(|e| VeilmatchError::Configuration(format!("registry RPC client: {e}")))?;
        Ok(Some(Self {
            registry_address,
            chain_selector: config.chain_selector.clone(),
            rpc,
        }))
    }

    /// Registry contract address.
    #[must_use]
    pub fn registry_address(&self) -> Address {
        self.registry_address
    }
}

#[async_trait]
impl ComplianceRegistry for JsonRpcRegistry {
    async fn is_verified(&self, identity: Address) -> Result<bool> {
        let rpc = self
            .rpc
            .as_ref()
            .ok_or_else(|| VeilmatchError::EligibilityCheck {
                reason: format!("unknown chain selector {}", self.chain_selector),
            })?;

        let data = rpc
            .eth_call(self.registry_address, &encode_is_verified(identity))
            .await
            .map_err(|e| VeilmatchError::EligibilityCheck {
                reason: e.to_string(),
            })?;
        debug!(chain = %self.chain_selector, bytes = data.len(), "isVerified returned");
        decode_is_verified(&data)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use alloy_primitives::keccak256;

    use super::*;

    #[test]
    fn calldata_layout() {
        let identity = Address::repeat_byte(0x42);
        let data = encode_is_verified(identity);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], &keccak256(b"isVerified(address)")[..4]);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..], identity.as_slice());
    }

    #[test]
    fn decodes_bool_word() {
        let mut word = [0u8; 32];
        assert!(!decode_is_verified(&word).unwrap());
        word[31] = 1;
        assert!(decode_is_verified(&word).unwrap());
    }

    #[test]
    fn short_return_data_is_an_error() {
        let err = decode_is_verified(&[1u8; 3]).unwrap_err();
        assert!(matches!(err, VeilmatchError::EligibilityCheck { .. }));
    }

    #[test]
    fn no_address_means_no_registry() {
        assert!(JsonRpcRegistry::from_config(&RegistryConfig::default()).unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_chain_selector_fails_lookup() {
        let config = RegistryConfig {
            registry_address: Some(Address::repeat_byte(0x01)),
            chain_selector: "no-such-chain".into(),
            rpc_urls: BTreeMap::new(),
            ..RegistryConfig::default()
        };
        let registry = JsonRpcRegistry::from_config(&config).unwrap().unwrap();
        let err = registry.is_verified(Address::repeat_byte(0x02)).await.unwrap_err();
        assert!(err.to_string().contains("unknown chain selector"));
    }
}
