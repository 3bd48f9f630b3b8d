use crate::QueueError;

/// Maximum payload size in bytes (256KB, the usual managed-queue ceiling)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 256 * 1024;

/// Message as held by the queue between deliveries
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub message_id: u64,
    pub payload: Vec<u8>,
    /// Deliveries handed out so far
    pub attempts: u32,
}

impl Message {
    pub fn new_with_limit(
        message_id: u64,
        payload: Vec<u8>,
        max_size: usize,
    ) -> Result<Self, QueueError> {
        if payload.len() > max_size {
            return Err(QueueError::message_too_large(payload.len(), max_size));
        }
        Ok(Self {
            message_id,
            payload,
            attempts: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// One hand-out of a message to a consumer. Must be acked or nacked.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub delivery_id: u64,
    pub message_id: u64,
    pub payload: Vec<u8>,
    /// 1 on first delivery
    pub attempt: u32,
}

/// Message that exhausted its retries or failed permanently
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetter {
    pub payload: Vec<u8>,
    pub reason: String,
}
