//! Transaction ledger contract and in-memory implementation

use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use types::{SwapQuote, Timestamp, Transaction, TransactionState};

const TABLE: &str = "transaction";

/// Outcome of the settlement gate
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementGate {
    /// Caller moved the record from STARTED to FINISHED and must apply the swap
    Acquired(Transaction),
    /// Record was already FINISHED; the swap must not be applied again
    AlreadyFinished,
}

/// Durable map from transaction id to transaction record
#[async_trait]
pub trait TransactionLedger: Send + Sync + Debug {
    /// Insert `record` unless its id exists; the claim redemption gate
    async fn create_if_absent(&self, record: Transaction) -> Result<(), StoreError>;

    async fn load(&self, transaction_id: &str) -> Result<Transaction, StoreError>;

    /// Write `record`; with `skip_null_fields` unset optional fields keep their
    /// stored values
    async fn overwrite(&self, record: Transaction, skip_null_fields: bool)
        -> Result<(), StoreError>;

    /// Atomically move a STARTED record to FINISHED with `quote` applied
    async fn finish_if_started(
        &self,
        transaction_id: &str,
        quote: SwapQuote,
        now: Timestamp,
    ) -> Result<SettlementGate, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryTransactionLedger {
    records: DashMap<String, Transaction>,
    unavailable: AtomicBool,
    fail_on_overwrite: AtomicBool,
}

impl InMemoryTransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Simulate an outage: every call fails with `Unavailable` until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Configure to fail on next overwrite
    pub fn fail_next_overwrite(&self) {
        self.fail_on_overwrite.store(true, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            warn!("Transaction ledger unavailable");
            return Err(StoreError::unavailable("transaction ledger offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionLedger for InMemoryTransactionLedger {
    async fn create_if_absent(&self, record: Transaction) -> Result<(), StoreError> {
        self.check_available()?;
        match self.records.entry(record.transaction_id.clone()) {
            Entry::Occupied(_) => {
                warn!(transaction_id = %record.transaction_id, "Claim already used");
                Err(StoreError::already_exists(TABLE, record.transaction_id))
            }
            Entry::Vacant(slot) => {
                info!(transaction_id = %record.transaction_id, "Initialized transaction");
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn load(&self, transaction_id: &str) -> Result<Transaction, StoreError> {
        self.check_available()?;
        self.records
            .get(transaction_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(TABLE, transaction_id))
    }

    async fn overwrite(
        &self,
        record: Transaction,
        skip_null_fields: bool,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        if self.fail_on_overwrite.swap(false, Ordering::Relaxed) {
            warn!(transaction_id = %record.transaction_id, "Transaction overwrite failed");
            return Err(StoreError::unavailable("simulated overwrite failure"));
        }
        match self.records.entry(record.transaction_id.clone()) {
            Entry::Occupied(mut existing) if skip_null_fields => {
                existing.get_mut().overlay(record);
            }
            Entry::Occupied(mut existing) => {
                existing.insert(record);
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
        Ok(())
    }

    async fn finish_if_started(
        &self,
        transaction_id: &str,
        quote: SwapQuote,
        now: Timestamp,
    ) -> Result<SettlementGate, StoreError> {
        self.check_available()?;
        match self.records.entry(transaction_id.to_string()) {
            Entry::Vacant(_) => Err(StoreError::not_found(TABLE, transaction_id)),
            Entry::Occupied(mut existing) => {
                if existing.get().transaction_state != TransactionState::Started {
                    return Ok(SettlementGate::AlreadyFinished);
                }
                existing
                    .get_mut()
                    .overlay(Transaction::finished(transaction_id, quote, now));
                info!(transaction_id, "Finished transaction");
                Ok(SettlementGate::Acquired(existing.get().clone()))
            }
        }
    }
}
