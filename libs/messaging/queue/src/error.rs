#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error("Queue closed")]
    Closed,

    #[error("Buffer full, message dropped (size: {size}B)")]
    BufferFull { size: usize },

    #[error("Message too large: {size}B exceeds limit of {limit}B")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("Unknown delivery: {0}")]
    UnknownDelivery(u64),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Dead letter write failed: {0}")]
    DeadLetterFailed(String),

    #[error("Acknowledgement failed: {0}")]
    AckFailed(String),
}

impl QueueError {
    /// Check if retrying the same call may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QueueError::BufferFull { .. } | QueueError::PublishFailed(_)
        )
    }

    pub fn message_too_large(size: usize, limit: usize) -> Self {
        QueueError::MessageTooLarge { size, limit }
    }

    pub fn publish_failed(msg: impl Into<String>) -> Self {
        QueueError::PublishFailed(msg.into())
    }

    pub fn dead_letter_failed(msg: impl Into<String>) -> Self {
        QueueError::DeadLetterFailed(msg.into())
    }

    pub fn ack_failed(msg: impl Into<String>) -> Self {
        QueueError::AckFailed(msg.into())
    }
}
