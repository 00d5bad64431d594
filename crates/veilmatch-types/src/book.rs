//! Wire shapes for the resting-order snapshot supplied by the backend.

use serde::{Deserialize, Serialize};

use crate::OrderId;

/// One still-encrypted resting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestingEntry {
    pub id: OrderId,
    /// Base64 ECIES envelope; may be empty for orders the backend could not
    /// provide a payload for.
    #[serde(default)]
    pub encrypted_payload: String,
}

impl RestingEntry {
    #[must_use]
    pub fn new(id: impl Into<String>, encrypted_payload: impl Into<String>) -> Self {
        Self {
            id: OrderId::new(id),
            encrypted_payload: encrypted_payload.into(),
        }
    }
}

/// Response body of the resting-order query, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrdersResponse {
    #[serde(default)]
    pub orders: Vec<RestingEntry>,
}
