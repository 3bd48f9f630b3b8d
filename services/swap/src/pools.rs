//! Liquidity pool creation and lookup

use crate::error::SwapError;
use amm::PoolLimits;
use std::sync::Arc;
use storage::{PoolStore, StoreError};
use tracing::{info, instrument};
use types::{Clock, CreatePoolRequest, LiquidityPool, PoolName, ValidationError};

#[derive(Debug, Clone)]
pub struct PoolService {
    pools: Arc<dyn PoolStore>,
    limits: PoolLimits,
    clock: Arc<dyn Clock>,
}

impl PoolService {
    pub fn new(pools: Arc<dyn PoolStore>, limits: PoolLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            pools,
            limits,
            clock,
        }
    }

    /// Create the pool `name` from two legs of equal market cap
    ///
    /// `asset_one` belongs to the alphabetically first asset in `name`.
    #[instrument(skip(self, request))]
    pub async fn create_pool(
        &self,
        name: &str,
        request: &CreatePoolRequest,
    ) -> Result<LiquidityPool, SwapError> {
        let pool_name: PoolName = name.parse()?;
        let (asset_one, asset_two) = match (request.asset_one, request.asset_two) {
            (Some(one), Some(two)) => (one, two),
            _ => return Err(ValidationError::MissingFields.into()),
        };
        self.limits.validate_new_pool(&asset_one, &asset_two)?;

        let now = self.clock.now();
        let pool = LiquidityPool {
            pool_name,
            asset_one,
            asset_two,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.pools
            .create_if_absent(pool.clone())
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => SwapError::pool_already_exists(),
                other => SwapError::Store(other),
            })?;

        info!(pool = %pool_name, "Liquidity pool created");
        Ok(pool)
    }

    pub async fn get_pool(&self, name: &str) -> Result<LiquidityPool, SwapError> {
        let pool_name: PoolName = name.parse()?;
        self.pools.load(&pool_name).await.map_err(|e| match e {
            StoreError::NotFound { .. } => SwapError::pool_not_found(),
            other => SwapError::Store(other),
        })
    }
}
