//! Three-phase swap protocol: Estimate, Submit, Settle

use crate::error::{SettleError, SwapError};
use amm::{market_caps, PricingEngine};
use claims::ClaimCodec;
use message_queue::MessageQueue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{PoolStore, SettlementGate, StoreError, TransactionLedger};
use tracing::{debug, error, info, instrument, warn};
use types::{
    Clock, LiquidityPool, SettlementMessage, SwapIntent, SwapQuote, Transaction, TransactionState,
};

/// Response of the Estimate phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapEstimate {
    pub swap_quote: SwapQuote,
    pub swap_claim_token: String,
}

/// Result of handling one settlement message
#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    /// Pool updated with this quote
    Settled(SwapQuote),
    /// Message was not a settlement produced by Submit; dropped
    Discarded,
    /// Transaction already settled; pool untouched
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct SwapOrchestrator {
    pools: Arc<dyn PoolStore>,
    ledger: Arc<dyn TransactionLedger>,
    queue: Arc<dyn MessageQueue>,
    claims: ClaimCodec,
    clock: Arc<dyn Clock>,
}

impl SwapOrchestrator {
    pub fn new(
        pools: Arc<dyn PoolStore>,
        ledger: Arc<dyn TransactionLedger>,
        queue: Arc<dyn MessageQueue>,
        claims: ClaimCodec,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pools,
            ledger,
            queue,
            claims,
            clock,
        }
    }

    /// Price `intent` against the current pool and issue a claim for it
    ///
    /// `request_id` becomes the claim's contract id, and later the
    /// transaction id. Nothing is persisted.
    #[instrument(skip(self, intent))]
    pub async fn estimate(
        &self,
        request_id: &str,
        intent: &SwapIntent,
    ) -> Result<SwapEstimate, SwapError> {
        let pool_name = intent.pool_name()?;
        let pool = self.pools.load(&pool_name).await.map_err(|e| match e {
            StoreError::NotFound { .. } => SwapError::pool_not_found(),
            other => SwapError::Store(other),
        })?;
        log_loaded(&pool);

        let swap_quote = PricingEngine::estimate(&pool, intent)?;
        let swap_claim_token = self
            .claims
            .issue(intent, request_id, self.clock.now())
            .await?;

        info!(
            pool = %pool_name,
            amount_in = %swap_quote.in_leg.amount,
            amount_out = %swap_quote.out_leg.amount,
            "Issued swap estimate"
        );
        Ok(SwapEstimate {
            swap_quote,
            swap_claim_token,
        })
    }

    /// Redeem a claim and hand it to settlement, returning the transaction id
    ///
    /// The ledger write is the single-use gate: of any number of Submits of one
    /// token, exactly one gets past it.
    #[instrument(skip_all)]
    pub async fn submit(&self, token: &str) -> Result<String, SwapError> {
        let claim = self.claims.open(token).await?;
        let now = self.clock.now();
        if claim.is_expired_at(now) {
            warn!(
                contract_id = %claim.contract_id,
                expires_at = %claim.expires_at,
                %now,
                "Swap claim is expired"
            );
            return Err(SwapError::Expired {
                contract_id: claim.contract_id,
                expired_at: claim.expires_at,
            });
        }

        self.ledger
            .create_if_absent(Transaction::started(&claim.contract_id, now))
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => SwapError::claim_already_used(),
                other => SwapError::Store(other),
            })?;

        let message = SettlementMessage {
            contract_id: claim.contract_id.clone(),
            swap_intent: claim.swap_intent,
        };
        let payload = serde_json::to_vec(&message)
            .map_err(|e| message_queue::QueueError::publish_failed(e.to_string()))?;
        self.queue.publish(payload).await?;

        info!(transaction_id = %claim.contract_id, "Submitted swap for settlement");
        Ok(claim.contract_id)
    }

    /// Apply one settlement message to its pool
    ///
    /// Re-prices against the pool as it is now, so the executed amounts may
    /// differ from the estimate. The ledger moves STARTED to FINISHED before
    /// the pool is written; a redelivered message finds FINISHED and leaves
    /// the pool alone.
    #[instrument(skip_all)]
    pub async fn settle(&self, payload: &[u8]) -> Result<SettleOutcome, SettleError> {
        let message: SettlementMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, size = payload.len(), "Discarding unreadable settlement message");
                return Ok(SettleOutcome::Discarded);
            }
        };
        let transaction_id = message.contract_id.as_str();

        let record = match self.ledger.load(transaction_id).await {
            Ok(record) => record,
            Err(StoreError::NotFound { .. }) => {
                warn!(transaction_id, "No transaction for settlement message");
                return Ok(SettleOutcome::Discarded);
            }
            Err(e) => return Err(e.into()),
        };
        if record.is_finished() {
            info!(transaction_id, "Transaction already settled");
            return Ok(SettleOutcome::Duplicate);
        }

        let intent = &message.swap_intent;
        let pool_name = match intent.pool_name() {
            Ok(name) => name,
            Err(e) => {
                warn!(transaction_id, error = %e, "Discarding settlement with invalid intent");
                return Ok(SettleOutcome::Discarded);
            }
        };
        let pool = self.pools.load(&pool_name).await.map_err(|e| match e {
            StoreError::NotFound { .. } => SettleError::PoolMissing(pool_name),
            other => SettleError::Store(other),
        })?;
        log_loaded(&pool);

        let quote = PricingEngine::estimate(&pool, intent)?;
        let now = self.clock.now();
        let updated = PricingEngine::apply(&pool, &quote, now)?;

        let finished = match self
            .ledger
            .finish_if_started(transaction_id, quote.clone(), now)
            .await
        {
            Ok(SettlementGate::Acquired(finished)) => finished,
            Ok(SettlementGate::AlreadyFinished) => {
                info!(transaction_id, "Lost settlement race, transaction already settled");
                return Ok(SettleOutcome::Duplicate);
            }
            Err(StoreError::NotFound { .. }) => return Ok(SettleOutcome::Discarded),
            Err(e) => return Err(e.into()),
        };

        if let Err(pool_error) = self.pools.overwrite(updated.clone(), true).await {
            return Err(match self.reopen(&record).await {
                Ok(()) => SettleError::Store(pool_error),
                Err(reopen_error) => {
                    error!(
                        transaction_id,
                        %pool_error,
                        %reopen_error,
                        "Transaction finished without pool update"
                    );
                    SettleError::Inconsistent {
                        transaction_id: transaction_id.to_string(),
                        pool_error,
                        reopen_error,
                    }
                }
            });
        }

        log_settled(&finished, &pool, &updated);
        Ok(SettleOutcome::Settled(quote))
    }

    /// Current ledger record for a submitted swap
    pub async fn get_transaction(&self, transaction_id: &str) -> Result<Transaction, SwapError> {
        self.ledger
            .load(transaction_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => SwapError::transaction_not_found(),
                other => SwapError::Store(other),
            })
    }

    /// Put a transaction back to STARTED after its pool write failed, so the
    /// redelivered message can settle it
    async fn reopen(&self, started: &Transaction) -> Result<(), StoreError> {
        let record = Transaction {
            transaction_state: TransactionState::Started,
            applied_quote: None,
            time_completed: None,
            ..started.clone()
        };
        self.ledger.overwrite(record, false).await?;
        warn!(
            transaction_id = %started.transaction_id,
            "Pool write failed, transaction reopened for redelivery"
        );
        Ok(())
    }
}

fn log_loaded(pool: &LiquidityPool) {
    let (cap_one, cap_two) = market_caps(pool);
    debug!(pool = %pool.pool_name, %cap_one, %cap_two, "Loaded pool");
}

fn log_settled(finished: &Transaction, before: &LiquidityPool, after: &LiquidityPool) {
    let transaction_id = finished.transaction_id.as_str();
    debug!(
        transaction_id,
        before_one = %before.asset_one.amount,
        before_two = %before.asset_two.amount,
        after_one = %after.asset_one.amount,
        after_two = %after.asset_two.amount,
        "Pool supplies updated"
    );
    info!(
        transaction_id,
        pool = %after.pool_name,
        started_at = ?finished.time_started,
        completed_at = ?finished.time_completed,
        "Settled swap"
    );
}
