//! # Orchard AMM Library - Bonding Curve Pricing Engine
//!
//! ## Purpose
//!
//! Pure pricing functions for two-asset pools. Quotes a swap against a pool
//! snapshot and applies a quote to produce the next pool state, keeping each
//! leg's market cap equal to the input leg's pre-swap market cap. No I/O and
//! no shared state: every function takes values and returns new values.
//!
//! ## Integration Points
//!
//! - **Input Sources**: pool snapshots loaded from the pool store, validated
//!   swap intents from the swap service
//! - **Output Destinations**: estimate responses, settlement writes, ledger
//!   records (`appliedQuote`)
//! - **Validation**: pool creation bounds and the equal-market-cap invariant
//!
//! ## Architecture Role
//!
//! ```text
//! SwapIntent + LiquidityPool → [PricingEngine::estimate] → SwapQuote
//! SwapQuote  + LiquidityPool → [PricingEngine::apply]    → LiquidityPool'
//! ```
//!
//! The curve is evaluated at the input asset's current price rather than on
//! raw supplies: with `capIn = amountIn × priceIn` and `k = capIn²`, adding
//! `capAdded` to the input side leaves `k / (capIn + capAdded)` on the output
//! side.
//!
//! ## Precision
//!
//! All arithmetic is [`Decimal`] with checked operations. Zero supplies or
//! prices surface as [`PricingError::DivisionByZero`] and never as NaN or
//! infinity.

pub mod bonding_curve;
pub mod errors;
pub mod pool_limits;

pub use bonding_curve::{market_caps, PricingEngine};
pub use errors::PricingError;
pub use pool_limits::{within_tolerance, PoolLimits};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
