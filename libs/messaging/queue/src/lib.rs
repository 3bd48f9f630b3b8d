//! # Orchard Queue - Settlement Handoff
//!
//! ## Purpose
//!
//! Decouples claim redemption from pool mutation. Submit publishes a
//! settlement message and returns; a worker consumes it later and applies the
//! swap. Delivery is at-least-once and unordered, so consumers must be
//! idempotent.
//!
//! ## Integration Points
//!
//! - **Publisher**: [`MessageQueue::publish`] from the swap orchestrator
//! - **Consumer**: [`MessageConsumer`] drained by the settlement worker, which
//!   acks handled deliveries and nacks those that hit an infrastructure error
//! - **Dead letters**: [`DeadLetterSink`] receives messages that failed
//!   permanently or exhausted their delivery attempts
//!
//! ## Architecture Role
//!
//! ```text
//! Submit ──publish──▶ [MessageQueue] ──receive──▶ SettlementWorker ──▶ Settle
//!                          ▲                           │
//!                          └─────────── nack ──────────┤
//!                                                      └──▶ [DeadLetterSink]
//! ```

pub mod dead_letter;
pub mod error;
pub mod memory;
pub mod message;

use async_trait::async_trait;
use std::fmt::Debug;

pub use dead_letter::InMemoryDeadLetters;
pub use error::QueueError;
pub use memory::{in_memory_queue, InMemoryConsumer, InMemoryQueue};
pub use message::{DeadLetter, Delivery, Message, DEFAULT_MAX_MESSAGE_SIZE};

/// Publishing side of a durable queue
#[async_trait]
pub trait MessageQueue: Send + Sync + Debug {
    /// Enqueue `payload`, returning the assigned message id
    async fn publish(&self, payload: Vec<u8>) -> Result<u64, QueueError>;
}

/// Consuming side of a durable queue
#[async_trait]
pub trait MessageConsumer: Send + Sync + Debug {
    /// Wait for the next delivery; `None` once the queue is closed and drained
    async fn receive(&self) -> Result<Option<Delivery>, QueueError>;

    /// Remove a handled delivery from the queue
    async fn ack(&self, delivery_id: u64) -> Result<(), QueueError>;

    /// Return a delivery to the queue for another attempt
    async fn nack(&self, delivery_id: u64) -> Result<(), QueueError>;
}

#[async_trait]
pub trait DeadLetterSink: Send + Sync + Debug {
    async fn dead_letter(&self, payload: Vec<u8>, reason: String) -> Result<(), QueueError>;
}
