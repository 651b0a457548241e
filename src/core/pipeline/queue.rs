//! Bounded pipeline queue.
//!
//! Ring buffer with an explicit capacity in which every entry carries the
//! cycle at which it leaves the pipeline. The DUT models use it to hold
//! in-flight operations: `latency` sets how long an entry stays invisible,
//! `capacity` sets when input ready drops, and a [`BackpressurePolicy`]
//! adds stalls on top of that.

use serde::{Deserialize, Serialize};

/// Cycles on which a unit withholds input ready regardless of free space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BackpressurePolicy {
    /// Ready whenever the queue has room.
    #[default]
    None,
    /// Ready drops on every cycle that is a multiple of `period`.
    EveryNth { period: u64 },
    /// Ready never rises.
    Stuck,
}

impl BackpressurePolicy {
    /// Returns `true` if input ready is withheld on `cycle`.
    pub fn stalls(&self, cycle: u64) -> bool {
        match *self {
            BackpressurePolicy::None => false,
            BackpressurePolicy::EveryNth { period } => period != 0 && cycle % period == 0,
            BackpressurePolicy::Stuck => true,
        }
    }
}

#[derive(Clone, Debug)]
struct Entry<T> {
    item: T,
    ready_at: u64,
}

/// Fixed-capacity FIFO of in-flight items.
#[derive(Clone, Debug)]
pub struct PipelineQueue<T> {
    slots: Vec<Option<Entry<T>>>,
    head: usize,
    len: usize,
    latency: u64,
}

impl<T> PipelineQueue<T> {
    /// Creates an empty queue. A capacity of zero is raised to one.
    pub fn new(capacity: usize, latency: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            latency,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Cycles an entry waits before it is ready.
    pub fn latency(&self) -> u64 {
        self.latency
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no entry is held.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `push` would fail.
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Enqueues `item` at cycle `now`; it becomes visible at `now + latency`.
    ///
    /// # Errors
    ///
    /// Gives the item back when the queue is full.
    pub fn push(&mut self, item: T, now: u64) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(Entry {
            item,
            ready_at: now + self.latency,
        });
        self.len += 1;
        Ok(())
    }

    /// Oldest item, if its latency has elapsed by `now`.
    pub fn peek_ready(&self, now: u64) -> Option<&T> {
        match self.slots[self.head].as_ref() {
            Some(entry) if self.len > 0 && entry.ready_at <= now => Some(&entry.item),
            _ => None,
        }
    }

    /// Removes the oldest item if its latency has elapsed by `now`.
    pub fn pop_ready(&mut self, now: u64) -> Option<T> {
        self.peek_ready(now)?;
        let entry = self.slots[self.head].take()?;
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        Some(entry.item)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}
