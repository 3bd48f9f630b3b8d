//! # Orchard Types Library
//!
//! Shared data model for the Orchard market maker: assets, liquidity pools,
//! swap intents and quotes, claims, settlement messages and transactions.
//!
//! ## Design Philosophy
//!
//! - **Allow-listed Assets**: [`Asset`] is a closed enum, so an unknown asset name
//!   can never reach pool math
//! - **Canonical Pool Names**: [`PoolName`] always orders its two assets, giving
//!   exactly one pool per unordered pair
//! - **Exact Arithmetic**: amounts and prices are [`Decimal`], never `f64`
//! - **Partial Writes**: optional timestamps and quote fields let stores merge an
//!   update without clobbering fields the writer did not touch
//! - **Explicit Time**: every time-dependent operation reads a [`Clock`]
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Asset, PoolName};
//!
//! let name = PoolName::for_pair(Asset::Bananas, Asset::Apples).unwrap();
//! assert_eq!(name.to_string(), "Apples-Bananas");
//! ```
//!
//! ## Integration Points
//!
//! - **amm**: prices [`SwapIntent`]s against [`LiquidityPool`] snapshots
//! - **storage**: persists [`LiquidityPool`] and [`Transaction`] records
//! - **claims**: seals [`Claim`]s into opaque tokens
//! - **swap service**: validates [`SwapIntentRequest`]s and moves
//!   [`SettlementMessage`]s across the queue

pub mod asset;
pub mod clock;
pub mod errors;
pub mod pool;
pub mod swap;
pub mod transaction;

pub use asset::Asset;
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::ValidationError;
pub use pool::{AssetQuote, CreatePoolRequest, LiquidityPool, PoolName};
pub use swap::{Claim, SettlementMessage, SwapIntent, SwapIntentRequest, SwapQuote};
pub use transaction::{Transaction, TransactionState};

pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Timestamp type used by every record in the system
pub type Timestamp = DateTime<Utc>;
