use crate::{DeadLetter, DeadLetterSink, QueueError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::error;

/// Dead letters kept in process with bounded storage; oldest entries are
/// evicted once full
#[derive(Debug)]
pub struct InMemoryDeadLetters {
    letters: Mutex<VecDeque<DeadLetter>>,
    max_letters: usize,
    fail_on_write: AtomicBool,
    total: AtomicU64,
}

impl InMemoryDeadLetters {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_letters: usize) -> Self {
        Self {
            letters: Mutex::new(VecDeque::with_capacity(max_letters.min(1024))),
            max_letters: max_letters.max(1),
            fail_on_write: AtomicBool::new(false),
            total: AtomicU64::new(0),
        }
    }

    pub fn letters(&self) -> Vec<DeadLetter> {
        self.letters.lock().iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.letters.lock().len()
    }

    /// Letters received since startup, including evicted ones
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Configure to fail on next write
    pub fn fail_next_write(&self) {
        self.fail_on_write.store(true, Ordering::Relaxed);
    }
}

impl Default for InMemoryDeadLetters {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryDeadLetters {
    async fn dead_letter(&self, payload: Vec<u8>, reason: String) -> Result<(), QueueError> {
        if self.fail_on_write.swap(false, Ordering::Relaxed) {
            return Err(QueueError::dead_letter_failed("Simulated write failure"));
        }

        error!(size = payload.len(), %reason, "Message dead-lettered");

        let mut letters = self.letters.lock();
        if letters.len() >= self.max_letters {
            letters.pop_front();
        }
        letters.push_back(DeadLetter { payload, reason });
        self.total.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
