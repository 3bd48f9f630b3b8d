//! # Orchard Storage - Pool Store and Transaction Ledger
//!
//! ## Purpose
//!
//! Durable-state contracts for the swap protocol. The [`PoolStore`] maps a
//! canonical pool name to its current state; the [`TransactionLedger`] maps a
//! claim's contract id to its transaction record. Both expose a
//! create-if-absent write, which is the only mutual-exclusion primitive the
//! protocol relies on.
//!
//! ## Integration Points
//!
//! - **Pool creation**: `PoolStore::create_if_absent` rejects a second pool for
//!   the same pair
//! - **Claim redemption**: `TransactionLedger::create_if_absent` lets exactly one
//!   Submit per contract id through
//! - **Settlement**: `TransactionLedger::finish_if_started` lets exactly one
//!   Settle per contract id apply its swap, then `PoolStore::overwrite`
//!   persists the new pool with a skip-null merge
//!
//! ## Architecture Role
//!
//! ```text
//! Submit ──create_if_absent──▶ [TransactionLedger] ◀──finish_if_started── Settle
//! Create ──create_if_absent──▶ [PoolStore]         ◀──load / overwrite─── Estimate, Settle
//! ```
//!
//! The in-memory implementations back each table with a `DashMap` and perform
//! every conditional write inside a single entry lock, so racing callers see
//! exactly one winner. Any other backend must give the same per-key atomicity.

pub mod error;
pub mod ledger;
pub mod pool_store;

pub use error::StoreError;
pub use ledger::{InMemoryTransactionLedger, SettlementGate, TransactionLedger};
pub use pool_store::{InMemoryPoolStore, PoolStore};
