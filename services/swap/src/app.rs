//! Service wiring from configuration

use crate::api::ApiState;
use crate::orchestrator::SwapOrchestrator;
use crate::pools::PoolService;
use crate::worker::{SettlementWorker, WorkerSettings};
use amm::PoolLimits;
use anyhow::{Context, Result};
use claims::{AesGcmEnvelope, ClaimCodec, EnvelopeCipher};
use config::{PoolSettings, ServiceConfig};
use message_queue::{in_memory_queue, InMemoryConsumer, InMemoryDeadLetters, InMemoryQueue};
use std::sync::Arc;
use std::time::Duration;
use storage::{InMemoryPoolStore, InMemoryTransactionLedger};
use tracing::{info, warn};
use types::Clock;

/// A fully wired service backed by in-process collaborators
#[derive(Debug)]
pub struct SwapService {
    pub orchestrator: Arc<SwapOrchestrator>,
    pub pools: Arc<PoolService>,
    pub worker: SettlementWorker,
    pub pool_store: Arc<InMemoryPoolStore>,
    pub ledger: Arc<InMemoryTransactionLedger>,
    pub queue: Arc<InMemoryQueue>,
    pub consumer: Arc<InMemoryConsumer>,
    pub dead_letters: Arc<InMemoryDeadLetters>,
}

impl SwapService {
    pub fn in_memory(
        config: &ServiceConfig,
        cipher: Arc<dyn EnvelopeCipher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let pool_store = Arc::new(InMemoryPoolStore::new());
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let (queue, consumer) = in_memory_queue(config.settlement.queue_capacity);
        let queue = Arc::new(queue);
        let consumer = Arc::new(consumer);
        let dead_letters = Arc::new(InMemoryDeadLetters::new());

        let ttl = chrono::Duration::from_std(Duration::from_secs(config.claims.ttl_secs))
            .context("Claim TTL out of range")?;
        let orchestrator = Arc::new(SwapOrchestrator::new(
            pool_store.clone(),
            ledger.clone(),
            queue.clone(),
            ClaimCodec::new(cipher, ttl),
            clock.clone(),
        ));
        let pools = Arc::new(PoolService::new(
            pool_store.clone(),
            pool_limits(&config.pools),
            clock,
        ));
        let worker = SettlementWorker::new(
            orchestrator.clone(),
            consumer.clone(),
            dead_letters.clone(),
            WorkerSettings {
                max_delivery_attempts: config.settlement.max_delivery_attempts.max(1),
                redelivery_delay: Duration::from_millis(config.settlement.redelivery_delay_ms),
            },
        );

        info!(
            ttl_secs = config.claims.ttl_secs,
            queue_capacity = config.settlement.queue_capacity,
            "Swap service wired with in-memory collaborators"
        );
        Ok(Self {
            orchestrator,
            pools,
            worker,
            pool_store,
            ledger,
            queue,
            consumer,
            dead_letters,
        })
    }

    pub fn api_state(&self) -> ApiState {
        ApiState {
            orchestrator: self.orchestrator.clone(),
            pools: self.pools.clone(),
        }
    }
}

pub fn pool_limits(settings: &PoolSettings) -> PoolLimits {
    PoolLimits {
        min_price: settings.min_price,
        max_price: settings.max_price,
        min_supply: settings.min_supply,
        max_supply: settings.max_supply,
        cap_tolerance: settings.cap_tolerance,
    }
}

/// Claim cipher from the configured key, or a per-process key when none is set
pub fn claim_cipher(config: &ServiceConfig) -> Result<Arc<dyn EnvelopeCipher>> {
    match config.claim_key_hex() {
        Some(key_hex) => {
            let cipher = AesGcmEnvelope::from_hex(&key_hex).context("Invalid claim key")?;
            Ok(Arc::new(cipher))
        }
        None => {
            warn!(
                "No claim key configured; using an ephemeral key. Outstanding claims will not \
                 survive a restart"
            );
            Ok(Arc::new(AesGcmEnvelope::ephemeral()))
        }
    }
}
