//! # veilmatch-types
//!
//! Shared types, errors, and configuration for the **VeilMatch** confidential
//! matching core.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`PairId`], [`MatchId`]
//! - **Order model**: [`Order`], [`OrderSide`]
//! - **Resting snapshot**: [`RestingEntry`], [`RestingOrdersResponse`]
//! - **Match model**: [`MatchResult`], [`Counterparty`]
//! - **Trigger I/O**: [`TriggerRequest`], [`MatchOrderTrigger`], [`TriggerResponse`], [`MatchStatus`]
//! - **Configuration**: [`EnclaveConfig`], [`GateOnError`], [`SettlementConfig`], [`EnclaveSecrets`]
//! - **Errors**: [`VeilmatchError`] with `VM_ERR_` prefix codes
//! - **Constants**: wire sizes, defaults, environment variable names

pub mod book;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod order;
pub mod trade;
pub mod trigger;

// Re-export all primary types at crate root for ergonomic imports:
//   use veilmatch_types::{Order, OrderSide, MatchResult, ...};

pub use book::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use trade::*;
pub use trigger::*;

pub use alloy_primitives::Address;

// Constants are accessed via `veilmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
