//! Decrypted bytes → validated [`Order`].
//!
//! The plaintext is a flat JSON object with fixed field names:
//!
//! ```json
//! { "id": "...", "pairId": "...", "side": "BUY",
//!   "amount": "1.5", "price": "2000.25",
//!   "recipientAddress": "0x...", "ownerIdentity": "0x..." }
//! ```
//!
//! The `id` inside the ciphertext is ignored. The order always takes the
//! identifier the caller supplied alongside the envelope, so a replayed
//! ciphertext cannot claim another order's identity.

use std::str::FromStr;

use rust_decimal::Decimal;
use k256::PublicKey;
use serde::Deserialize;
use serde_json::{Value, json};
use veilmatch_types::{Address, Order, OrderId, OrderSide, PairId, Result, VeilmatchError};

use crate::ecies::{EnclaveKey, encrypt};
use crate::envelope::Envelope;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrder {
    pair_id: String,
    side: OrderSide,
    amount: Value,
    price: Value,
    recipient_address: String,
    owner_identity: String,
}

fn malformed(reason: impl Into<String>) -> VeilmatchError {
    VeilmatchError::MalformedOrder {
        reason: reason.into(),
    }
}

/// Exact decimal from a JSON string or an integer literal.
///
/// Fractional number literals are rejected: serde_json has already rounded
/// them through `f64` by the time they reach us.
fn parse_decimal(field: &str, value: &Value) -> Result<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => return Err(malformed(format!("{field} must be a decimal string"))),
    };
    let parsed = Decimal::from_str_exact(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| malformed(format!("{field} is not a decimal")))?;
    if parsed <= Decimal::ZERO {
        return Err(malformed(format!("{field} must be positive")));
    }
    Ok(parsed.normalize())
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    let addr = Address::from_str(value.trim())
        .map_err(|_| malformed(format!("{field} is not a 20-byte hex address")))?;
    if addr == Address::ZERO {
        return Err(malformed(format!("{field} is the zero address")));
    }
    Ok(addr)
}

/// Decode plaintext bytes into an order carrying `trusted_id`.
pub fn decode_order(plaintext: &[u8], trusted_id: &OrderId) -> Result<Order> {
    let wire: WireOrder =
        serde_json::from_slice(plaintext).map_err(|e| malformed(e.to_string()))?;

    if wire.pair_id.trim().is_empty() {
        return Err(malformed("pairId is empty"));
    }

    Ok(Order {
        id: trusted_id.clone(),
        pair_id: PairId::new(wire.pair_id),
        side: wire.side,
        amount: parse_decimal("amount", &wire.amount)?,
        price: parse_decimal("price", &wire.price)?,
        recipient_address: parse_address("recipientAddress", &wire.recipient_address)?,
        owner_identity: parse_address("ownerIdentity", &wire.owner_identity)?,
    })
}

/// Base64 envelope → decrypted, decoded order.
pub fn open_order(encoded: &str, key: &EnclaveKey, trusted_id: &OrderId) -> Result<Order> {
    let envelope = Envelope::from_base64(encoded)?;
    let plaintext = key.decrypt(&envelope)?;
    decode_order(&plaintext, trusted_id)
}

/// Plaintext wire form of `order`, readable by [`decode_order`]. The id is
/// left out; it always comes from the caller.
pub fn encode_order(order: &Order) -> Result<Vec<u8>> {
    let wire = json!({
        "pairId": order.pair_id.as_str(),
        "side": order.side,
        "amount": order.amount.to_string(),
        "price": order.price.to_string(),
        "recipientAddress": order.recipient_address.to_string(),
        "ownerIdentity": order.owner_identity.to_string(),
    });
    Ok(serde_json::to_vec(&wire)?)
}

/// Encode and encrypt `order` to `recipient`, base64 for transport.
pub fn seal_order(order: &Order, recipient: &PublicKey) -> Result<String> {
    Ok(encrypt(&encode_order(order)?, recipient)?.to_base64())
}
