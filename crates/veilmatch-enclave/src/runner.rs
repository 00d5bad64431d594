//! Newline-delimited replay of triggers.
//!
//! Each input line is one trigger JSON; each output line is the handler
//! result. With a [`MemoryOrderStore`] attached the runner owns the pool and
//! keeps it current between lines:
//!
//! - unmatched (`pending` without a reason): the incoming order rests
//! - `matched`, resting side larger: the counterparty keeps its place with
//!   the remaining amount
//! - `matched`, incoming side larger: the counterparty leaves and the
//!   incoming remainder rests at the back
//! - `matched`, equal amounts: the counterparty leaves
//!
//! Remainders are re-sealed to the enclave key. Orders held by the gate do
//! not rest.

use rust_decimal::Decimal;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use veilmatch_ingress::{EnclaveKey, open_order, seal_order};
use veilmatch_types::{
    MatchOrderTrigger, MatchStatus, MatchSummary, Order, RestingEntry, Result, TriggerRequest,
    TriggerResponse, VeilmatchError,
};

use crate::{MemoryOrderStore, TriggerHandler};

/// Drives a [`TriggerHandler`] over a stream of triggers.
#[derive(Debug)]
pub struct ReplayRunner {
    handler: TriggerHandler,
    store: Option<MemoryOrderStore>,
}

impl ReplayRunner {
    #[must_use]
    pub fn new(handler: TriggerHandler, store: Option<MemoryOrderStore>) -> Self {
        Self { handler, store }
    }

    /// Process one trigger line.
    pub async fn process_line(&self, line: &str) -> Value {
        let request = match TriggerRequest::from_slice(line.as_bytes()) {
            Ok(request) => request,
            Err(_) => return self.handler.handle(line.as_bytes()).await,
        };
        let Ok(trigger) = request.clone().into_match_order() else {
            return self.handler.handle_request(request).await.into_json();
        };

        let response = self.handler.match_order(trigger.clone()).await;
        if let Some(store) = &self.store {
            let key = self.handler.enclave_key();
            if let Err(e) = record_outcome(store, key, &trigger, &response).await {
                warn!(order_id = %trigger.order_id, error = %e, "Memory pool not updated");
            }
        }
        response.into_json()
    }

    /// Read triggers until EOF, writing one result per line. Blank lines
    /// are ignored.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut processed = 0usize;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let result = self.process_line(&line).await;
            let mut rendered = serde_json::to_vec(&result)?;
            rendered.push(b'\n');
            output.write_all(&rendered).await?;
            output.flush().await?;
            processed += 1;
        }
        Ok(processed)
    }
}

/// Apply a handler outcome to the in-memory pool.
async fn record_outcome(
    store: &MemoryOrderStore,
    key: &EnclaveKey,
    trigger: &MatchOrderTrigger,
    response: &TriggerResponse,
) -> Result<()> {
    match (response.status, &response.trade) {
        (MatchStatus::Pending, _) if response.reason.is_none() => {
            store
                .insert(
                    trigger.pair_id.clone(),
                    RestingEntry {
                        id: trigger.order_id.clone(),
                        encrypted_payload: trigger.encrypted_order.clone(),
                    },
                )
                .await;
            debug!(order_id = %trigger.order_id, "Order rests in memory pool");
            Ok(())
        }
        (MatchStatus::Matched, Some(trade)) => apply_fill(store, key, trigger, trade).await,
        _ => Ok(()),
    }
}

async fn apply_fill(
    store: &MemoryOrderStore,
    key: &EnclaveKey,
    trigger: &MatchOrderTrigger,
    trade: &MatchSummary,
) -> Result<()> {
    let pair = &trigger.pair_id;
    let counterparty_id = if trade.buyer_order_id == trigger.order_id {
        &trade.seller_order_id
    } else {
        &trade.buyer_order_id
    };
    let entry = store.get(pair, counterparty_id).await.ok_or_else(|| {
        VeilmatchError::Internal(format!("counterparty {counterparty_id} not in memory pool"))
    })?;

    let resting = open_order(&entry.encrypted_payload, key, counterparty_id)?;
    if let Some(rest) = remainder(&resting, trade.trade_amount)? {
        store
            .replace_payload(pair, counterparty_id, seal_order(&rest, &key.public_key())?)
            .await;
        debug!(order_id = %counterparty_id, "Counterparty partially filled, keeps its place");
        return Ok(());
    }

    store.remove(pair, counterparty_id).await;
    debug!(order_id = %counterparty_id, "Counterparty filled, removed from memory pool");

    let incoming = open_order(&trigger.encrypted_order, key, &trigger.order_id)?;
    if let Some(rest) = remainder(&incoming, trade.trade_amount)? {
        store
            .insert(
                pair.clone(),
                RestingEntry {
                    id: trigger.order_id.clone(),
                    encrypted_payload: seal_order(&rest, &key.public_key())?,
                },
            )
            .await;
        debug!(order_id = %trigger.order_id, "Incoming remainder rests in memory pool");
    }
    Ok(())
}

/// `order` reduced by `filled`, or `None` if nothing is left.
fn remainder(order: &Order, filled: Decimal) -> Result<Option<Order>> {
    let left = order
        .amount
        .checked_sub(filled)
        .ok_or_else(|| VeilmatchError::AmountOverflow {
            reason: "remaining amount".into(),
        })?;
    if left <= Decimal::ZERO {
        return Ok(None);
    }
    let mut rest = order.clone();
    rest.amount = left;
    Ok(Some(rest))
}
