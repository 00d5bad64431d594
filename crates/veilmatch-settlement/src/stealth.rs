//! Per-trade stealth addresses.
//!
//! `stealth = last20(keccak256(domain || recipient || match_id))`
//!
//! The same recipient gets an unlinkable address for every match, and the
//! derivation is reproducible by anyone who knows the recipient and match id.

use alloy_primitives::{Address, keccak256};
use veilmatch_types::MatchId;

const STEALTH_DOMAIN: &[u8] = b"veilmatch:stealth:v1:";

#[must_use]
pub fn stealth_address(recipient: Address, match_id: &MatchId) -> Address {
    let mut preimage = Vec::with_capacity(STEALTH_DOMAIN.len() + 20 + 32);
    preimage.extend_from_slice(STEALTH_DOMAIN);
    preimage.extend_from_slice(recipient.as_slice());
    preimage.extend_from_slice(match_id.as_bytes());
    Address::from_slice(&keccak256(&preimage)[12..])
}
