//! Pool store contract and in-memory implementation

use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use types::{LiquidityPool, PoolName};

const TABLE: &str = "pool";

/// Durable map from canonical pool name to pool state
#[async_trait]
pub trait PoolStore: Send + Sync + Debug {
    /// Insert `pool` unless a pool with the same name exists
    async fn create_if_absent(&self, pool: LiquidityPool) -> Result<(), StoreError>;

    async fn load(&self, name: &PoolName) -> Result<LiquidityPool, StoreError>;

    /// Write `pool`; with `skip_null_fields` unset optional fields keep their
    /// stored values
    async fn overwrite(&self, pool: LiquidityPool, skip_null_fields: bool)
        -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPoolStore {
    pools: DashMap<PoolName, LiquidityPool>,
    unavailable: AtomicBool,
    fail_on_write: AtomicBool,
}

impl InMemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Simulate an outage: every call fails with `Unavailable` until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Configure the next write to fail with `Unavailable`; reads still succeed
    pub fn fail_next_write(&self) {
        self.fail_on_write.store(true, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            warn!("Pool store unavailable");
            return Err(StoreError::unavailable("pool store offline"));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        self.check_available()?;
        if self.fail_on_write.swap(false, Ordering::Relaxed) {
            return Err(StoreError::unavailable("simulated write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PoolStore for InMemoryPoolStore {
    async fn create_if_absent(&self, pool: LiquidityPool) -> Result<(), StoreError> {
        self.check_writable()?;
        match self.pools.entry(pool.pool_name) {
            Entry::Occupied(_) => {
                warn!(pool = %pool.pool_name, "Liquidity pool already exists");
                Err(StoreError::already_exists(TABLE, pool.pool_name.to_string()))
            }
            Entry::Vacant(slot) => {
                info!(pool = %pool.pool_name, "Created liquidity pool");
                slot.insert(pool);
                Ok(())
            }
        }
    }

    async fn load(&self, name: &PoolName) -> Result<LiquidityPool, StoreError> {
        self.check_available()?;
        let pool = self
            .pools
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(TABLE, name.to_string()))?;
        debug!(
            pool = %name,
            cap_one = %pool.asset_one.market_cap(),
            cap_two = %pool.asset_two.market_cap(),
            "Loaded liquidity pool"
        );
        Ok(pool)
    }

    async fn overwrite(
        &self,
        pool: LiquidityPool,
        skip_null_fields: bool,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        match self.pools.entry(pool.pool_name) {
            Entry::Occupied(mut existing) if skip_null_fields => {
                existing.get_mut().overlay(pool);
            }
            Entry::Occupied(mut existing) => {
                existing.insert(pool);
            }
            Entry::Vacant(slot) => {
                slot.insert(pool);
            }
        }
        Ok(())
    }
}
