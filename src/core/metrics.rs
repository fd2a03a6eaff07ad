//! # Exact pool counters.
//!
//! The event bus is lossy by design (lagging receivers skip events), so exact
//! accounting lives here. [`Counters`] is shared by the dispatcher and its
//! workers; [`PoolMetrics`] is the point-in-time copy handed to callers.
//!
//! Terminal counters are bumped **before** the outcome is delivered to a
//! [`Receipt`](crate::Receipt), so a caller that awaited a receipt always sees
//! its request counted.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::requests::Outcome;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub submitted: AtomicU64,
    pub dropped: AtomicU64,
    pub succeeded: AtomicU64,
    pub exhausted: AtomicU64,
    pub rejected: AtomicU64,
    pub unhandled: AtomicU64,
    pub abandoned: AtomicU64,
    pub attempts_failed: AtomicU64,
    pub attempts_timed_out: AtomicU64,
}

#[inline]
fn bump(c: &AtomicU64) {
    c.fetch_add(1, Ordering::Relaxed);
}

#[inline]
fn read(c: &AtomicU64) -> u64 {
    c.load(Ordering::Relaxed)
}

impl Counters {
    pub fn record_submitted(&self) {
        bump(&self.submitted);
    }

    pub fn record_dropped(&self) {
        bump(&self.dropped);
    }

    pub fn record_attempt_error(&self, timed_out: bool) {
        if timed_out {
            bump(&self.attempts_timed_out);
        } else {
            bump(&self.attempts_failed);
        }
    }

    pub fn record_outcome(&self, outcome: &Outcome) {
        let c = match outcome {
            Outcome::Succeeded { .. } => &self.succeeded,
            Outcome::Exhausted { .. } => &self.exhausted,
            Outcome::Rejected { .. } => &self.rejected,
            Outcome::Unhandled => &self.unhandled,
            Outcome::Abandoned { .. } => &self.abandoned,
        };
        bump(c);
    }

    pub fn snapshot(&self, workers: usize, queued: usize) -> PoolMetrics {
        PoolMetrics {
            workers,
            queued,
            submitted: read(&self.submitted),
            dropped: read(&self.dropped),
            succeeded: read(&self.succeeded),
            exhausted: read(&self.exhausted),
            rejected: read(&self.rejected),
            unhandled: read(&self.unhandled),
            abandoned: read(&self.abandoned),
            attempts_failed: read(&self.attempts_failed),
            attempts_timed_out: read(&self.attempts_timed_out),
        }
    }
}

/// Point-in-time view of the pool's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Worker count (live workers minus pending stop signals).
    pub workers: usize,
    /// Requests currently waiting in the queue.
    pub queued: usize,
    /// Requests passed to `submit`/`try_submit`.
    pub submitted: u64,
    /// Requests dropped because the queue was full or closed.
    pub dropped: u64,
    /// Requests that completed successfully.
    pub succeeded: u64,
    /// Requests that ran out of attempts.
    pub exhausted: u64,
    /// Requests ended by a fatal handler error.
    pub rejected: u64,
    /// Requests with no registered handler.
    pub unhandled: u64,
    /// Requests cut short by a forced stop.
    pub abandoned: u64,
    /// Attempts that returned an error or panicked.
    pub attempts_failed: u64,
    /// Attempts that hit their timeout.
    pub attempts_timed_out: u64,
}

impl PoolMetrics {
    /// Requests that reached a terminal state.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.exhausted + self.rejected + self.unhandled + self.abandoned
    }

    /// Fraction of completed requests that succeeded (`0.0` when nothing completed).
    ///
    /// # Example
    /// ```
    /// use dynapool::PoolMetrics;
    ///
    /// let m = PoolMetrics { succeeded: 3, exhausted: 1, ..Default::default() };
    /// assert_eq!(m.success_rate(), 0.75);
    /// ```
    pub fn success_rate(&self) -> f64 {
        match self.completed() {
            0 => 0.0,
            n => self.succeeded as f64 / n as f64,
        }
    }
}
