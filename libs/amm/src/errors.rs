use thiserror::Error;
use types::{Asset, PoolName};

/// Pricing failures; all of them are deterministic for a given input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PricingError {
    #[error("Division by zero: {0}")]
    DivisionByZero(&'static str),

    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    #[error("Asset {asset} is not traded in pool {pool}")]
    AssetNotInPool { asset: Asset, pool: PoolName },

    #[error("Swap must name two different assets")]
    SameAsset,

    #[error("Positive number must be provided for amount to swap.")]
    NegativeAmount,

    #[error("Insufficient liquidity in pool {pool}: {asset} supply would drop to zero")]
    InsufficientLiquidity { asset: Asset, pool: PoolName },
}
