//! Settlement worker draining the queue into the orchestrator

use crate::orchestrator::{SettleOutcome, SwapOrchestrator};
use message_queue::{DeadLetterSink, Delivery, MessageConsumer, QueueError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Delivery policy for settlement messages
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Deliveries allowed before a message is dead-lettered
    pub max_delivery_attempts: u32,
    /// Pause after a nack before receiving again
    pub redelivery_delay: Duration,
}

/// What the worker did with one delivery
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Acked(SettleOutcome),
    Retried,
    DeadLettered,
}

#[derive(Debug)]
pub struct SettlementWorker {
    orchestrator: Arc<SwapOrchestrator>,
    consumer: Arc<dyn MessageConsumer>,
    dead_letters: Arc<dyn DeadLetterSink>,
    settings: WorkerSettings,
}

impl SettlementWorker {
    pub fn new(
        orchestrator: Arc<SwapOrchestrator>,
        consumer: Arc<dyn MessageConsumer>,
        dead_letters: Arc<dyn DeadLetterSink>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            orchestrator,
            consumer,
            dead_letters,
            settings,
        }
    }

    /// Receive and settle until `shutdown` flips to true or the queue closes
    ///
    /// A failure on one delivery never stops the loop; the delivery is left
    /// with the queue for redelivery instead.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            max_delivery_attempts = self.settings.max_delivery_attempts,
            "Settlement worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let received = tokio::select! {
                received = self.consumer.receive() => received,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };
            let delivery = match received {
                Ok(Some(delivery)) => delivery,
                Ok(None) | Err(QueueError::Closed) => {
                    info!("Settlement queue closed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to receive settlement message");
                    tokio::time::sleep(self.settings.redelivery_delay).await;
                    continue;
                }
            };

            if self.handle(delivery).await == DeliveryOutcome::Retried {
                tokio::time::sleep(self.settings.redelivery_delay).await;
            }
        }

        info!("Settlement worker stopped");
    }

    /// Settle one delivery and ack, nack or dead-letter it
    pub async fn handle(&self, delivery: Delivery) -> DeliveryOutcome {
        let Delivery {
            delivery_id,
            message_id,
            payload,
            attempt,
        } = delivery;

        match self.orchestrator.settle(&payload).await {
            Ok(outcome) => {
                debug!(message_id, ?outcome, "Settlement message handled");
                self.ack(delivery_id, message_id).await;
                DeliveryOutcome::Acked(outcome)
            }
            Err(e) if e.is_permanent() => {
                error!(message_id, error = %e, "Settlement failed permanently");
                self.dead_letter(delivery_id, message_id, payload, e.to_string())
                    .await
            }
            Err(e) if attempt >= self.settings.max_delivery_attempts => {
                error!(message_id, attempt, error = %e, "Settlement retries exhausted");
                let reason = format!("{} (after {} attempts)", e, attempt);
                self.dead_letter(delivery_id, message_id, payload, reason)
                    .await
            }
            Err(e) => {
                warn!(message_id, attempt, error = %e, "Settlement failed, will retry");
                self.nack(delivery_id, message_id).await;
                DeliveryOutcome::Retried
            }
        }
    }

    /// Park a message; if the dead-letter write fails the message goes back
    /// to the queue so the write is retried on redelivery
    async fn dead_letter(
        &self,
        delivery_id: u64,
        message_id: u64,
        payload: Vec<u8>,
        reason: String,
    ) -> DeliveryOutcome {
        if let Err(e) = self.dead_letters.dead_letter(payload, reason).await {
            error!(message_id, error = %e, "Dead-letter write failed, returning message");
            self.nack(delivery_id, message_id).await;
            return DeliveryOutcome::Retried;
        }
        self.ack(delivery_id, message_id).await;
        DeliveryOutcome::DeadLettered
    }

    // Left unacked, the message is redelivered and stopped by the settlement gate
    async fn ack(&self, delivery_id: u64, message_id: u64) {
        if let Err(e) = self.consumer.ack(delivery_id).await {
            error!(message_id, delivery_id, error = %e, "Failed to ack settlement message");
        }
    }

    async fn nack(&self, delivery_id: u64, message_id: u64) {
        if let Err(e) = self.consumer.nack(delivery_id).await {
            error!(message_id, delivery_id, error = %e, "Failed to nack settlement message");
        }
    }
}
