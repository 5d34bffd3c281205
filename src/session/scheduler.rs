//! Erase batching — bounds how much eraser work one tick can do.
//!
//! DESIGN
//! ======
//! Draws never touch the scheduler. An erase is queued when its diameter is
//! strictly above the large-eraser threshold, or when anything is already
//! queued (so erases keep their relative order). Everything else is applied
//! on admission. Each tick drains at most `max_batch_size` entries, oldest
//! first.
//!
//! EDGE CASES
//! ==========
//! The queue is bounded by `capacity`. Admitting into a full queue first
//! hands back the oldest batch for synchronous application, so nothing is
//! dropped and FIFO order still holds. The caller reports that as
//! `Admission::Backpressured`.

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;

use std::collections::VecDeque;

use serde::Serialize;

use crate::event::EraseEvent;

/// Outcome of submitting one stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "admission", rename_all = "snake_case")]
pub enum Admission {
    /// Rasterized immediately.
    Applied,
    /// Waiting in the pending erase queue.
    Queued,
    /// Queued, after `drained` older erases were applied to make room.
    Backpressured { drained: usize },
}

/// FIFO of pending erases plus the admission policy.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    queue: VecDeque<EraseEvent>,
    threshold: f32,
    max_batch_size: usize,
    capacity: usize,
}

impl BatchScheduler {
    #[must_use]
    pub fn new(threshold: f32, max_batch_size: usize, capacity: usize) -> Self {
        let max_batch_size = max_batch_size.max(1);
        Self {
            queue: VecDeque::new(),
            threshold,
            max_batch_size,
            capacity: capacity.max(max_batch_size),
        }
    }

    /// Whether `diameter` counts as a large eraser.
    #[must_use]
    pub fn is_large(&self, diameter: f32) -> bool {
        diameter > self.threshold
    }

    /// Whether `event` must wait in the queue instead of being applied now.
    #[must_use]
    pub fn should_queue(&self, event: &EraseEvent) -> bool {
        self.is_large(event.diameter) || !self.queue.is_empty()
    }

    /// Append `event`. When the queue is full the oldest batch is removed
    /// first and returned; the caller must apply it before anything else.
    pub fn enqueue(&mut self, event: EraseEvent) -> Vec<EraseEvent> {
        let overflow = if self.queue.len() >= self.capacity { self.drain_batch() } else { Vec::new() };
        self.queue.push_back(event);
        overflow
    }

    /// Remove up to `max_batch_size` of the oldest pending erases.
    pub fn drain_batch(&mut self) -> Vec<EraseEvent> {
        let count = self.max_batch_size.min(self.queue.len());
        self.queue.drain(..count).collect()
    }

    /// Pending erases, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &EraseEvent> {
        self.queue.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
