//! # Worker-count accounting.
//!
//! [`PoolState`] is the only mutex-guarded state of the pool. It tracks the set
//! of live workers and the number of stop signals that were sent but not yet
//! consumed:
//!
//! ```text
//! count = live.len() − pending_stops
//! ```
//!
//! `count` is what the scaler and `remove_worker` reason about: a worker that
//! has been told to stop is no longer counted even if it is still finishing a
//! request. The stop signal itself is sent by the caller **after** the lock is
//! released.
//!
//! ## Rules
//! - `live.len() ≤ max_workers` (admission checks the live set, not `count`)
//! - `pending_stops ≤ live.len()`, so the stop channel (capacity `max_workers`) never fills
//! - once closed, no worker is admitted again

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::WorkerId;
use crate::error::RuntimeError;

#[derive(Debug, Default)]
struct Inner {
    live: BTreeSet<WorkerId>,
    pending_stops: usize,
    closed: bool,
}

impl Inner {
    fn count(&self) -> usize {
        self.live.len().saturating_sub(self.pending_stops)
    }
}

/// Mutex-guarded worker registry plus the id generator.
#[derive(Debug, Default)]
pub(crate) struct PoolState {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl PoolState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new worker id, refusing past `max` live workers or after close.
    pub fn admit(&self, max: usize) -> Result<WorkerId, RuntimeError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(RuntimeError::Closed);
        }
        if inner.live.len() >= max {
            return Err(RuntimeError::AtCapacity { max });
        }
        let id = WorkerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        inner.live.insert(id);
        Ok(id)
    }

    /// Reserves one removal if `count > min`. The caller then sends the stop signal.
    pub fn begin_remove(&self, min: usize) -> bool {
        let mut inner = self.lock();
        if inner.count() > min {
            inner.pending_stops += 1;
            true
        } else {
            false
        }
    }

    /// Rolls back a reservation whose stop signal could not be sent.
    pub fn cancel_remove(&self) {
        let mut inner = self.lock();
        inner.pending_stops = inner.pending_stops.saturating_sub(1);
    }

    /// Worker `id` consumed a stop signal and is leaving.
    pub fn on_stop_consumed(&self, id: WorkerId) -> usize {
        let mut inner = self.lock();
        inner.live.remove(&id);
        inner.pending_stops = inner.pending_stops.saturating_sub(1);
        inner.count()
    }

    /// Worker `id` left for any other reason (queue closed, forced stop).
    pub fn on_exit(&self, id: WorkerId) -> usize {
        let mut inner = self.lock();
        inner.live.remove(&id);
        inner.pending_stops = inner.pending_stops.min(inner.live.len());
        inner.count()
    }

    /// Marks the pool closed. Returns `false` if it already was.
    pub fn close(&self) -> bool {
        let mut inner = self.lock();
        !std::mem::replace(&mut inner.closed, true)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Current worker count (live minus pending stops).
    pub fn count(&self) -> usize {
        self.lock().count()
    }

    /// Ids of all workers that have not exited yet, in ascending order.
    pub fn snapshot(&self) -> Vec<WorkerId> {
        self.lock().live.iter().copied().collect()
    }
}
