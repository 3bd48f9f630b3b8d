//! Client-facing validation failures
//!
//! Every variant is a rejection of caller input; none of them is retryable.
//! Messages are returned to clients verbatim.

use crate::asset::Asset;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("One or more fields missing for this request.")]
    MissingFields,

    #[error("Invalid asset. Supported assets: {}", Asset::supported_names().join(", "))]
    InvalidAssetName,

    #[error("Two different assets must be provided.")]
    DuplicateAsset,

    #[error("Invalid name for liquidity pool.")]
    InvalidPoolName,

    #[error("Pool name must be created with assets in alphabetical order.")]
    PoolNameAssetOrder,

    #[error("Positive number must be provided for amount to swap.")]
    NegativeAmount,

    #[error("Price must be set between {min} and {max}")]
    PriceOutOfRange { min: Decimal, max: Decimal },

    #[error("Supply must be set between {min} and {max}")]
    SupplyOutOfRange { min: Decimal, max: Decimal },

    #[error("Market caps of coins are unequal in this update.")]
    UnequalMarketCap,
}
