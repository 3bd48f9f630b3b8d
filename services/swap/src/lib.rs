//! # Orchard Swap Service
//!
//! ## Purpose
//!
//! Runs the claim-based swap protocol over a two-asset constant-market-cap
//! pool. Clients price a swap, receive a sealed claim, redeem the claim once,
//! and the swap is applied to the pool asynchronously.
//!
//! ## Integration Points
//!
//! - **HTTP**: [`api::routes`] exposes pool creation and lookup, Estimate,
//!   Submit and transaction status
//! - **Settlement**: [`worker::SettlementWorker`] drains the settlement queue
//!   into [`orchestrator::SwapOrchestrator::settle`]
//! - **Collaborators**: pool store, transaction ledger, queue, dead letters and
//!   claim cipher are injected as trait objects; [`app::SwapService`] wires the
//!   in-memory implementations
//!
//! ## Architecture Role
//!
//! ```text
//! Client ──estimate──▶ [PoolStore] ──PricingEngine──▶ quote + claim token
//! Client ──submit────▶ [TransactionLedger: STARTED] ──publish──▶ [MessageQueue]
//!                                                                    │
//! [PoolStore] ◀──overwrite── apply ◀── [Ledger: FINISHED] ◀── SettlementWorker
//! ```
//!
//! Settlement re-prices against the pool state at settle time, so the amounts
//! applied can differ from the estimate the client saw.

pub mod api;
pub mod app;
pub mod error;
pub mod orchestrator;
pub mod pools;
pub mod worker;

pub use app::SwapService;
pub use error::{SettleError, SwapError};
pub use orchestrator::{SettleOutcome, SwapEstimate, SwapOrchestrator};
pub use pools::PoolService;
pub use worker::{DeliveryOutcome, SettlementWorker, WorkerSettings};
