//! On-chain report settlement.
//!
//! ```text
//! MatchResult -> stealth addresses -> SettlementReport (ABI) -> sign -> submitReport
//! ```
//!
//! Every failure here is a hard error: a report that was not confirmed on
//! chain is not a settlement.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::info;
use veilmatch_compliance::JsonRpcClient;
use veilmatch_types::{MatchResult, OnChainConfig, PairTokens, Result, VeilmatchError};

use crate::report::{build_settlement_report, encode_settlement_report, encode_verification_report};
use crate::stealth::stealth_address;
use crate::{
    JsonRpcReportWriter, LocalKeyReportSigner, ReportSigner, ReportWriter, SettlementEmitter,
    SettlementProtocol, WriteReceipt,
};

/// Signs and submits settlement reports for matched trades.
pub struct OnChainReportEmitter {
    signer: Arc<dyn ReportSigner>,
    writer: Arc<dyn ReportWriter>,
    pairs: BTreeMap<String, PairTokens>,
}

impl OnChainReportEmitter {
    pub fn new(
        signer: Arc<dyn ReportSigner>,
        writer: Arc<dyn ReportWriter>,
        pairs: BTreeMap<String, PairTokens>,
    ) -> Self {
        Self {
            signer,
            writer,
            pairs,
        }
    }

    /// Local-key signer and JSON-RPC writer for `config`.
    pub fn from_config(
        config: &OnChainConfig,
        rpc_url: &str,
        report_key_hex: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let rpc = JsonRpcClient::new(rpc_url, timeout)
            .map_err(|e| VeilmatchError::Configuration(format!("report RPC client: {e}")))?;
        let signer = LocalKeyReportSigner::from_hex(report_key_hex)?;
        info!(signer = %signer.signer_address(), receiver = %config.receiver_address, "On-chain settlement ready");
        Ok(Self::new(
            Arc::new(signer),
            Arc::new(JsonRpcReportWriter::new(rpc, config)),
            config.pairs.clone(),
        ))
    }

    fn tokens(&self, trade: &MatchResult) -> Result<&PairTokens> {
        self.pairs
            .get(trade.pair_id.as_str())
            .ok_or_else(|| VeilmatchError::ReportEncoding {
                reason: format!("no token mapping for pair {}", trade.pair_id),
            })
    }

    /// Sign and submit a verification-only report for `nullifier_hash`.
    pub async fn submit_verification(&self, nullifier_hash: U256) -> Result<WriteReceipt> {
        let report = encode_verification_report(nullifier_hash);
        let signature = self.signer.sign_report(&report).await?;
        let receipt = self.writer.write_report(&report, &signature).await?;
        info!(tx_hash = %receipt.tx_hash, "Verification report confirmed");
        Ok(receipt)
    }
}

#[async_trait]
impl SettlementEmitter for OnChainReportEmitter {
    fn protocol(&self) -> SettlementProtocol {
        SettlementProtocol::OnChainReport
    }

    async fn emit(&self, trade: &MatchResult) -> Result<Map<String, Value>> {
        let tokens = self.tokens(trade)?;
        let stealth_buyer = stealth_address(trade.buyer.recipient_address, &trade.match_id);
        let stealth_seller = stealth_address(trade.seller.recipient_address, &trade.match_id);

        let report = build_settlement_report(trade, tokens, stealth_buyer, stealth_seller)?;
        let encoded = encode_settlement_report(&report);
        let signature = self.signer.sign_report(&encoded).await?;
        let receipt = self.writer.write_report(&encoded, &signature).await?;

        info!(match_id = %trade.match_id, tx_hash = %receipt.tx_hash, "Settlement report confirmed");

        let mut out = Map::new();
        out.insert("txHash".into(), json!(receipt.tx_hash));
        if let Some(block) = receipt.block_number {
            out.insert("blockNumber".into(), Value::String(block));
        }
        Ok(out)
    }
}

impl std::fmt::Debug for OnChainReportEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnChainReportEmitter")
            .field("signer", &self.signer.signer_address())
            .field("pairs", &self.pairs.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
