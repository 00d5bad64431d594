//! # veilmatch-matchcore
//!
//! **Pure deterministic counterparty selection for VeilMatch.**
//!
//! MatchCore is the compute plane -- it takes one decrypted incoming order
//! and the decrypted resting snapshot and picks at most one counterparty.
//! It has:
//!
//! - **Zero side effects**: no network, no storage, no compliance logic
//! - **Deterministic output**: same input -> same [`MatchResult`](veilmatch_types::MatchResult)
//! - **Exact arithmetic**: `rust_decimal` only, never binary floating point
//! - **Price-time priority**: better price first, then earlier arrival

pub mod matcher;
pub mod orderbook;
pub mod price_level;

pub use matcher::{execution_price, find_counterparty};
pub use orderbook::RestingBook;
pub use price_level::PriceLevel;
