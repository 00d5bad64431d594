//! Decryption of the resting-order snapshot.
//!
//! The snapshot comes from an untrusted store and may be stale, contain
//! duplicates, or carry payloads for other pairs. Every entry that cannot be
//! opened or does not belong in this match attempt is skipped individually;
//! one bad entry never aborts the batch. Arrival order is preserved because
//! MatchCore uses it for time priority.

use tracing::{debug, warn};
use veilmatch_types::{Order, OrderId, PairId, RestingEntry, VeilmatchError};

use crate::{decoder::open_order, ecies::EnclaveKey};

/// Outcome of opening a snapshot.
#[derive(Debug, Default)]
pub struct OpenedBook {
    /// Decrypted orders, in snapshot order.
    pub orders: Vec<Order>,
    /// Entries dropped, with the reason for each.
    pub skipped: Vec<VeilmatchError>,
}

/// Open every usable entry of `entries` for a match against `incoming_id`
/// on `pair_id`.
pub fn open_resting_orders(
    entries: &[RestingEntry],
    key: &EnclaveKey,
    incoming_id: &OrderId,
    pair_id: &PairId,
) -> OpenedBook {
    let mut book = OpenedBook::default();

    for entry in entries {
        if entry.encrypted_payload.trim().is_empty() || entry.id == *incoming_id {
            continue;
        }

        match open_order(&entry.encrypted_payload, key, &entry.id) {
            Ok(order) if order.pair_id != *pair_id => {
                book.skipped.push(VeilmatchError::RestingOrderSkipped {
                    id: entry.id.clone(),
                    reason: "pair mismatch".into(),
                });
            }
            Ok(order) => book.orders.push(order),
            Err(err) => {
                warn!(order_id = %entry.id, error = %err, "Skipping resting order");
                book.skipped.push(VeilmatchError::RestingOrderSkipped {
                    id: entry.id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    debug!(
        pair = %pair_id,
        opened = book.orders.len(),
        skipped = book.skipped.len(),
        "Resting snapshot opened"
    );
    book
}
