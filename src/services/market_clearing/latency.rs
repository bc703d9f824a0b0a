use tracing::{debug, error};

use super::types::{ClearedFrame, SimTime};
use crate::error::{AuctionError, Result};

/// Fixed-capacity ring buffer delaying cleared frames until their start time.
///
/// One slot always stays free, so the queue is full when advancing `back`
/// would land on `front`.
#[derive(Debug, Clone)]
pub struct LatencyQueue {
    slots: Vec<Option<ClearedFrame>>,
    front: usize,
    back: usize,
}

impl LatencyQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            slots: vec![None; capacity],
            front: 0,
            back: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        (self.back + self.capacity() - self.front) % self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.front == self.back
    }

    pub fn is_full(&self) -> bool {
        (self.back + 1) % self.capacity() == self.front
    }

    /// Append a frame. A full queue means the latency outgrew the buffer and is fatal.
    pub fn enqueue(&mut self, frame: ClearedFrame) -> Result<()> {
        if self.is_full() {
            error!(
                "Latency queue overflow: {} slots hold unpublished frames, market {} cannot be queued",
                self.capacity(),
                frame.market_id
            );
            return Err(AuctionError::QueueOverflow {
                capacity: self.capacity(),
            });
        }

        self.slots[self.back] = Some(frame);
        self.back = (self.back + 1) % self.capacity();
        Ok(())
    }

    /// Remove the oldest frame if its start time has been reached
    pub fn pop_ready(&mut self, now: SimTime) -> Option<ClearedFrame> {
        if self.is_empty() {
            debug!("Latency queue empty at t={}", now);
            return None;
        }

        let ready = self.slots[self.front]
            .as_ref()
            .is_some_and(|frame| frame.start_time <= now);
        if !ready {
            debug!("Oldest queued frame not applicable yet at t={}", now);
            return None;
        }

        let frame = self.slots[self.front].take();
        self.front = (self.front + 1) % self.capacity();
        frame
    }

    /// Oldest queued frame, without removing it
    pub fn peek(&self) -> Option<&ClearedFrame> {
        if self.is_empty() {
            None
        } else {
            self.slots[self.front].as_ref()
        }
    }
}
