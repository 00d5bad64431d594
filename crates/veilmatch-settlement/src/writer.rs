//! Report submission capability.

use std::time::Duration;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use veilmatch_compliance::JsonRpcClient;
use veilmatch_types::{OnChainConfig, Result, VeilmatchError};

use crate::report::submit_report_calldata;

/// Confirmation of a submitted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub tx_hash: B256,
    pub block_number: Option<String>,
}

/// Delivers a signed report to the receiver contract.
#[async_trait]
pub trait ReportWriter: Send + Sync {
    /// Submit and wait for the outcome. A reverted or unconfirmed
    /// transaction is an error.
    async fn write_report(&self, report: &[u8], signature: &[u8]) -> Result<WriteReceipt>;
}

/// `submitReport(bytes,bytes)` through a node-managed sender account.
#[derive(Debug)]
pub struct JsonRpcReportWriter {
    rpc: JsonRpcClient,
    sender: Address,
    receiver: Address,
    gas_limit: u64,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl JsonRpcReportWriter {
    pub fn new(rpc: JsonRpcClient, config: &OnChainConfig) -> Self {
        Self {
            rpc,
            sender: config.sender_address,
            receiver: config.receiver_address,
            gas_limit: config.gas_limit,
            poll_attempts: config.receipt_poll_attempts.max(1),
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
        }
    }

    #[must_use]
    pub fn receiver(&self) -> Address {
        self.receiver
    }
}

#[async_trait]
impl ReportWriter for JsonRpcReportWriter {
    async fn write_report(&self, report: &[u8], signature: &[u8]) -> Result<WriteReceipt> {
        let calldata = submit_report_calldata(report, signature);
        let tx_hash = self
            .rpc
            .send_transaction(self.sender, self.receiver, &calldata, self.gas_limit)
            .await
            .map_err(|e| VeilmatchError::SettlementTransport {
                reason: format!("report submission: {e}"),
            })?;
        debug!(%tx_hash, "Report transaction sent");

        for attempt in 1..=self.poll_attempts {
            let receipt = self.rpc.transaction_receipt(tx_hash).await.map_err(|e| {
                VeilmatchError::SettlementTransport {
                    reason: format!("receipt lookup: {e}"),
                }
            })?;
            match receipt {
                Some(r) if r.succeeded() => {
                    info!(%tx_hash, block = ?r.block_number, "Report confirmed");
                    return Ok(WriteReceipt {
                        tx_hash,
                        block_number: r.block_number,
                    });
                }
                Some(_) => {
                    warn!(%tx_hash, "Report transaction reverted");
                    return Err(VeilmatchError::OnChainRejected {
                        reason: format!("transaction {tx_hash} reverted"),
                    });
                }
                None => {
                    debug!(%tx_hash, attempt, "Receipt not yet available");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(VeilmatchError::OnChainRejected {
            reason: format!(
                "transaction {tx_hash} not confirmed after {} polls",
                self.poll_attempts
            ),
        })
    }
}
