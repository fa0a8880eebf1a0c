use heapless::Deque;
use log::error;

use crate::storage::{Bucket, Resolution};

/// Maximum number of finalization steps waiting for the store
pub const PENDING_CAPACITY: usize = 16;

/// One unit of persistence work left over from a bucket close
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Finalization {
    /// Insert a closed bucket, then prune and maybe cascade
    Persist(Bucket),
    /// Build a `target` bucket from the finer buckets before `closing`
    Compact { target: Resolution, closing: Bucket },
}

/// FIFO of finalization steps
///
/// A closed bucket enters the queue at close time, so the open accumulator
/// can restart right away. A step leaves the queue only once it succeeded.
#[derive(Default)]
pub struct PendingWork {
    queue: Deque<Finalization, PENDING_CAPACITY>,
}

impl PendingWork {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn front(&self) -> Option<Finalization> {
        self.queue.front().copied()
    }

    pub fn complete_front(&mut self) {
        self.queue.pop_front();
    }

    /// Queue a new step. When full, the oldest step is dropped.
    pub fn push(&mut self, step: Finalization) {
        if self.queue.is_full() {
            if let Some(dropped) = self.queue.pop_front() {
                error!("Pending work full, dropping {:?}", dropped);
            }
        }
        let _ = self.queue.push_back(step);
    }

    /// Queue a follow-up step so it runs before anything queued later.
    pub fn push_next(&mut self, step: Finalization) {
        if self.queue.is_full() {
            if let Some(dropped) = self.queue.pop_back() {
                error!("Pending work full, dropping {:?}", dropped);
            }
        }
        let _ = self.queue.push_front(step);
    }
}
