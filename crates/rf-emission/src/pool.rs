//! Emission Pool
//!
//! Two independently bounded collections:
//! - free queue: cleared records owned solely by the pool. Every free record
//!   is blank, so the order they come back out in is not observable.
//! - in-use queue: dispatched records that may still be held elsewhere
//!
//! Each collection is its own lock-free MPMC queue; no operation ever touches
//! both under a shared guard. A record is only cleared after `Arc::get_mut`
//! proves the pool holds the sole reference.
//!
//! ```text
//! acquire() ──► populate ──► dispatch ──► track() ──► maintain()
//!     ▲                                                  │
//!     └────────────── free queue ◄── clear (sole owner) ─┘
//! ```

use crate::{Emission, EmissionError, Result};
use crossbeam_queue::ArrayQueue;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Strong references the pool itself holds on a tracked record
pub const POOL_HOLD: usize = 1;

/// Outcome of one maintenance sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintainReport {
    /// Still referenced elsewhere, re-queued unchanged
    pub retained: usize,
    /// Cleared and returned to the free queue
    pub reclaimed: usize,
    /// Released because a collection was full
    pub dropped: usize,
}

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub allocated: u64,
    pub reused: u64,
    pub tracked: u64,
    pub untracked: u64,
    pub reclaimed: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    allocated: AtomicU64,
    reused: AtomicU64,
    tracked: AtomicU64,
    untracked: AtomicU64,
    reclaimed: AtomicU64,
    dropped: AtomicU64,
}

/// Bounded recycler for `Emission` records
pub struct EmissionPool {
    free: ArrayQueue<Arc<Emission>>,
    in_use: ArrayQueue<Arc<Emission>>,
    counters: Counters,
}

impl EmissionPool {
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn new(free_capacity: usize, in_use_capacity: usize) -> Result<Self> {
        if free_capacity == 0 {
            return Err(EmissionError::InvalidCapacity { collection: "free" });
        }
        if in_use_capacity == 0 {
            return Err(EmissionError::InvalidCapacity { collection: "in-use" });
        }
        Ok(Self {
            free: ArrayQueue::new(free_capacity),
            in_use: ArrayQueue::new(in_use_capacity),
            counters: Counters::default(),
        })
    }

    /// Pop a cleared record, or allocate one when the free queue is empty.
    /// The returned record is uniquely held. Never blocks.
    pub fn acquire(&self) -> Arc<Emission> {
        match self.free.pop() {
            Some(em) => {
                self.counters.reused.fetch_add(1, Ordering::Relaxed);
                em
            }
            None => {
                self.counters.allocated.fetch_add(1, Ordering::Relaxed);
                Arc::new(Emission::default())
            }
        }
    }

    /// Queue a dispatched record for later reclamation.
    ///
    /// Returns `false` when the in-use queue is full; the record is then
    /// released and freed normally once its last holder drops it.
    pub fn track(&self, em: Arc<Emission>) -> bool {
        match self.in_use.push(em) {
            Ok(()) => {
                self.counters.tracked.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.counters.untracked.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Per-frame sweep of the in-use queue.
    ///
    /// Records with an outside holder are re-queued untouched; records held
    /// only by the pool are cleared and pushed to the free queue, or dropped
    /// when the free queue is full.
    pub fn maintain(&self) -> MaintainReport {
        let mut report = MaintainReport::default();

        // Only sweep what was queued at entry; concurrent tracks wait a frame.
        let pending = self.in_use.len();
        for _ in 0..pending {
            let Some(mut em) = self.in_use.pop() else {
                break;
            };

            match Arc::get_mut(&mut em) {
                Some(record) => record.clear(),
                None => {
                    if self.in_use.push(em).is_ok() {
                        report.retained += 1;
                    } else {
                        report.dropped += 1;
                    }
                    continue;
                }
            }

            if self.free.push(em).is_ok() {
                report.reclaimed += 1;
            } else {
                report.dropped += 1;
            }
        }

        self.counters
            .reclaimed
            .fetch_add(report.reclaimed as u64, Ordering::Relaxed);
        self.counters
            .dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);

        if report.reclaimed > 0 || report.dropped > 0 {
            debug!(
                retained = report.retained,
                reclaimed = report.reclaimed,
                dropped = report.dropped,
                "emission pool maintained"
            );
        }

        report
    }

    /// Release every pool-held reference (shutdown / reset)
    pub fn clear_all(&self) {
        while self.free.pop().is_some() {}
        while self.in_use.pop().is_some() {}
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn in_use_len(&self) -> usize {
        self.in_use.len()
    }

    pub fn free_capacity(&self) -> usize {
        self.free.capacity()
    }

    pub fn in_use_capacity(&self) -> usize {
        self.in_use.capacity()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.counters.allocated.load(Ordering::Relaxed),
            reused: self.counters.reused.load(Ordering::Relaxed),
            tracked: self.counters.tracked.load(Ordering::Relaxed),
            untracked: self.counters.untracked.load(Ordering::Relaxed),
            reclaimed: self.counters.reclaimed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for EmissionPool {
    fn default() -> Self {
        Self {
            free: ArrayQueue::new(Self::DEFAULT_CAPACITY),
            in_use: ArrayQueue::new(Self::DEFAULT_CAPACITY),
            counters: Counters::default(),
        }
    }
}

impl std::fmt::Debug for EmissionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmissionPool")
            .field("free", &self.free.len())
            .field("free_capacity", &self.free.capacity())
            .field("in_use", &self.in_use.len())
            .field("in_use_capacity", &self.in_use.capacity())
            .finish()
    }
}
