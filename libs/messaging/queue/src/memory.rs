//! In-process queue backed by a bounded tokio channel

use crate::message::DEFAULT_MAX_MESSAGE_SIZE;
use crate::{Delivery, Message, MessageConsumer, MessageQueue, QueueError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

/// Create a connected publisher/consumer pair holding at most `capacity`
/// undelivered messages
pub fn in_memory_queue(capacity: usize) -> (InMemoryQueue, InMemoryConsumer) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let queue = InMemoryQueue {
        sender,
        next_message_id: AtomicU64::new(0),
        max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        fail_on_publish: AtomicBool::new(false),
        published: AtomicU64::new(0),
    };
    let consumer = InMemoryConsumer {
        receiver: tokio::sync::Mutex::new(receiver),
        redeliveries: Mutex::new(VecDeque::new()),
        in_flight: Mutex::new(HashMap::new()),
        wakeup: Notify::new(),
        next_delivery_id: AtomicU64::new(0),
        fail_on_ack: AtomicBool::new(false),
    };
    (queue, consumer)
}

#[derive(Debug)]
pub struct InMemoryQueue {
    sender: mpsc::Sender<Message>,
    next_message_id: AtomicU64,
    max_message_size: usize,
    fail_on_publish: AtomicBool,
    published: AtomicU64,
}

impl InMemoryQueue {
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Configure to fail on next publish
    pub fn fail_next_publish(&self) {
        self.fail_on_publish.store(true, Ordering::Relaxed);
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn publish(&self, payload: Vec<u8>) -> Result<u64, QueueError> {
        if self.fail_on_publish.swap(false, Ordering::Relaxed) {
            return Err(QueueError::publish_failed("Simulated publish failure"));
        }

        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed) + 1;
        let message = Message::new_with_limit(message_id, payload, self.max_message_size)?;
        let size = message.size();

        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                warn!(message_id, size, "Queue full, message dropped");
                QueueError::BufferFull { size }
            }
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;

        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(message_id, size, "Published message");
        Ok(message_id)
    }
}

#[derive(Debug)]
pub struct InMemoryConsumer {
    receiver: tokio::sync::Mutex<mpsc::Receiver<Message>>,
    redeliveries: Mutex<VecDeque<Message>>,
    in_flight: Mutex<HashMap<u64, Message>>,
    wakeup: Notify,
    next_delivery_id: AtomicU64,
    fail_on_ack: AtomicBool,
}

impl InMemoryConsumer {
    /// Deliveries handed out and not yet acked or nacked
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Configure to fail on next ack; the delivery stays in flight
    pub fn fail_next_ack(&self) {
        self.fail_on_ack.store(true, Ordering::Relaxed);
    }

    fn hand_out(&self, mut message: Message) -> Delivery {
        message.attempts += 1;
        let delivery_id = self.next_delivery_id.fetch_add(1, Ordering::Relaxed) + 1;
        let delivery = Delivery {
            delivery_id,
            message_id: message.message_id,
            payload: message.payload.clone(),
            attempt: message.attempts,
        };
        self.in_flight.lock().insert(delivery_id, message);
        delivery
    }

    fn is_drained(&self) -> bool {
        self.in_flight.lock().is_empty() && self.redeliveries.lock().is_empty()
    }
}

#[async_trait]
impl MessageConsumer for InMemoryConsumer {
    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        loop {
            let redelivery = self.redeliveries.lock().pop_front();
            if let Some(message) = redelivery {
                return Ok(Some(self.hand_out(message)));
            }

            // None: woken by an ack/nack, look at the redelivery list again
            let received = {
                let mut receiver = self.receiver.lock().await;
                tokio::select! {
                    received = receiver.recv() => Some(received),
                    _ = self.wakeup.notified() => None,
                }
            };

            match received {
                Some(Some(message)) => return Ok(Some(self.hand_out(message))),
                Some(None) => {
                    // All publishers gone; finish once nothing can come back
                    if self.is_drained() {
                        return Ok(None);
                    }
                    self.wakeup.notified().await;
                }
                None => continue,
            }
        }
    }

    async fn ack(&self, delivery_id: u64) -> Result<(), QueueError> {
        if self.fail_on_ack.swap(false, Ordering::Relaxed) {
            return Err(QueueError::ack_failed("Simulated ack failure"));
        }
        self.in_flight
            .lock()
            .remove(&delivery_id)
            .ok_or(QueueError::UnknownDelivery(delivery_id))?;
        self.wakeup.notify_one();
        Ok(())
    }

    async fn nack(&self, delivery_id: u64) -> Result<(), QueueError> {
        let message = self
            .in_flight
            .lock()
            .remove(&delivery_id)
            .ok_or(QueueError::UnknownDelivery(delivery_id))?;
        debug!(
            message_id = message.message_id,
            attempts = message.attempts,
            "Message returned for redelivery"
        );
        self.redeliveries.lock().push_back(message);
        self.wakeup.notify_one();
        Ok(())
    }
}
