//! Minimal Ethereum JSON-RPC client over `reqwest`.
//!
//! Covers exactly what the enclave needs: read-only `eth_call`, node-signed
//! `eth_sendTransaction`, and `eth_getTransactionReceipt`. Every request has
//! the configured timeout; there are no retries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

/// Failure of a single JSON-RPC exchange.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("rpc error {code}: {message}")]
    Node { code: i64, message: String },
    #[error("decode: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

/// The subset of a transaction receipt the report writer inspects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: B256,
    /// `0x1` on success, `0x0` on revert.
    pub status: Option<String>,
    pub block_number: Option<String>,
}

impl TxReceipt {
    /// `true` when the node reports a successful execution.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.status.as_deref(), Some("0x1" | "0x01"))
    }
}

/// A JSON-RPC endpoint for one chain.
#[derive(Debug)]
pub struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    /// Build a client with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// Endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one request and return its `result`. A JSON `null` result is
    /// returned as-is to callers asking for `Option<T>`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "JSON-RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&JsonRpcRequest {
                jsonrpc: "2.0",
                method,
                params,
                id,
            })
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RpcError::Transport(format!("HTTP {}", response.status())));
        }

        let body: JsonRpcResponse<Value> = response
            .json()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(RpcError::Node {
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(body.result.unwrap_or(Value::Null))
            .map_err(|e| RpcError::Decode(e.to_string()))
    }

    /// `eth_call` against the latest block.
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let params = json!([
            { "to": to, "data": format!("0x{}", hex::encode(data)) },
            "latest"
        ]);
        let raw: String = self.request("eth_call", params).await?;
        decode_hex(&raw)
    }

    /// `eth_sendTransaction` from a node-managed account. Returns the hash.
    pub async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
        gas: u64,
    ) -> Result<B256, RpcError> {
        let params = json!([{
            "from": from,
            "to": to,
            "gas": format!("0x{gas:x}"),
            "data": format!("0x{}", hex::encode(data)),
        }]);
        self.request("eth_sendTransaction", params).await
    }

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    pub async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, RpcError> {
        self.request("eth_getTransactionReceipt", json!([hash])).await
    }
}

/// Decode a `0x`-prefixed hex string.
pub fn decode_hex(raw: &str) -> Result<Vec<u8>, RpcError> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(stripped).map_err(|e| RpcError::Decode(format!("invalid hex: {e}")))
}
