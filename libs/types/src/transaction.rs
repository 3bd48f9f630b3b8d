//! Transaction ledger records

use crate::swap::SwapQuote;
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    /// Claim redeemed, settlement pending
    Started,
    /// Swap applied to the pool
    Finished,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Started => f.write_str("STARTED"),
            TransactionState::Finished => f.write_str("FINISHED"),
        }
    }
}

/// Ledger entry keyed by the claim's contract id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_state: TransactionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_quote: Option<SwapQuote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_started: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_completed: Option<Timestamp>,
}

impl Transaction {
    /// Record written by the redemption gate
    pub fn started(transaction_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            transaction_state: TransactionState::Started,
            applied_quote: None,
            time_started: Some(now),
            time_completed: None,
        }
    }

    /// Partial record written by settlement; leaves `time_started` unset
    pub fn finished(transaction_id: impl Into<String>, quote: SwapQuote, now: Timestamp) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            transaction_state: TransactionState::Finished,
            applied_quote: Some(quote),
            time_started: None,
            time_completed: Some(now),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.transaction_state == TransactionState::Finished
    }

    /// Merge `update` into `self`, keeping existing values where the update
    /// leaves an optional field unset
    pub fn overlay(&mut self, update: Transaction) {
        self.transaction_state = update.transaction_state;
        if update.applied_quote.is_some() {
            self.applied_quote = update.applied_quote;
        }
        if update.time_started.is_some() {
            self.time_started = update.time_started;
        }
        if update.time_completed.is_some() {
            self.time_completed = update.time_completed;
        }
    }
}
