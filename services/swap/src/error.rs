//! Error types for the swap service

use amm::PricingError;
use claims::ClaimError;
use message_queue::QueueError;
use storage::StoreError;
use thiserror::Error;
use types::{PoolName, Timestamp, ValidationError};

pub const POOL_NOT_FOUND: &str = "Liquidity pool does not exist.";
pub const POOL_ALREADY_EXISTS: &str = "Liquidity pool for this pair already exists.";
pub const TRANSACTION_NOT_FOUND: &str = "Transaction does not exist.";
pub const CLAIM_ALREADY_USED: &str = "Claim is already used.";
pub const CLAIM_EXPIRED: &str = "Claim is expired.";
pub const INVALID_CLAIM: &str = "Invalid swap claim.";

/// Failures returned synchronously by Estimate, Submit and the pool API
#[derive(Debug, Error)]
pub enum SwapError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    AlreadyExists(&'static str),

    #[error("Claim is expired.")]
    Expired {
        contract_id: String,
        expired_at: Timestamp,
    },

    #[error("Invalid swap claim.")]
    MalformedClaim,

    #[error("{0}")]
    Pricing(#[from] PricingError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Claim error: {0}")]
    Cipher(ClaimError),
}

impl SwapError {
    pub fn pool_not_found() -> Self {
        SwapError::NotFound(POOL_NOT_FOUND)
    }

    pub fn pool_already_exists() -> Self {
        SwapError::AlreadyExists(POOL_ALREADY_EXISTS)
    }

    pub fn transaction_not_found() -> Self {
        SwapError::NotFound(TRANSACTION_NOT_FOUND)
    }

    pub fn claim_already_used() -> Self {
        SwapError::AlreadyExists(CLAIM_ALREADY_USED)
    }

    /// Rejection of the caller's input, as opposed to an operational failure
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            SwapError::Store(_) | SwapError::Queue(_) | SwapError::Cipher(_)
        )
    }

    /// Error category reported in API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            SwapError::NotFound(_) => "NOT_FOUND",
            SwapError::AlreadyExists(_) => "CONFLICT",
            e if e.is_client_error() => "BAD_REQUEST",
            _ => "INTERNAL",
        }
    }
}

impl From<ClaimError> for SwapError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Malformed(_) => SwapError::MalformedClaim,
            other => SwapError::Cipher(other),
        }
    }
}

/// Failures of the asynchronous settlement phase
#[derive(Debug, Error)]
pub enum SettleError {
    #[error("Liquidity pool {0} missing at settlement")]
    PoolMissing(PoolName),

    #[error("Swap cannot be priced at settlement: {0}")]
    Pricing(#[from] PricingError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Ledger says FINISHED but the pool write did not happen and the
    /// transaction could not be reopened
    #[error(
        "Transaction {transaction_id} marked finished without a pool update \
         (pool write: {pool_error}; reopen: {reopen_error})"
    )]
    Inconsistent {
        transaction_id: String,
        pool_error: StoreError,
        reopen_error: StoreError,
    },
}

impl SettleError {
    /// Redelivering the message cannot succeed
    pub fn is_permanent(&self) -> bool {
        match self {
            SettleError::PoolMissing(_)
            | SettleError::Pricing(_)
            | SettleError::Inconsistent { .. } => true,
            SettleError::Store(e) => !e.is_operational(),
        }
    }
}
