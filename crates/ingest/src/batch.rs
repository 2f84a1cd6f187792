//! Fixed-capacity accumulator for parsed events.
//!
//! The ingestor pushes validated events and flushes whenever the buffer
//! reaches capacity, then once more for the remainder at end of stream.

use chronologicon_core::HistoricalEvent;

pub struct EventBatcher {
    buffer: Vec<HistoricalEvent>,
    capacity: usize,
}

impl EventBatcher {
    /// Create a batcher that reports full at `capacity` events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: HistoricalEvent) {
        self.buffer.push(event);
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    /// Take everything buffered, leaving the batcher empty.
    pub fn flush(&mut self) -> Vec<HistoricalEvent> {
        std::mem::replace(&mut self.buffer, Vec::with_capacity(self.capacity))
    }

    /// Flush only when full, otherwise return `None`.
    pub fn try_flush(&mut self) -> Option<Vec<HistoricalEvent>> {
        if self.is_full() {
            Some(self.flush())
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
