//! # Runtime events emitted by the dispatcher, its workers and the scaler.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Worker lifecycle**: workers starting/stopping, scaling decisions
//! - **Request lifecycle**: attempts, retries, terminal outcomes, drops
//! - **Shutdown**: stop requested, drained in time, deadline exceeded
//! - **Subscriber health**: overflow and panics inside observers
//!
//! The [`Event`] struct carries optional metadata such as worker id, request id,
//! attempt number, timeouts, queue load and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use dynapool::{Event, EventKind, RequestType};
//!
//! let ev = Event::new(EventKind::AttemptTimedOut)
//!     .with_request_type(RequestType(1))
//!     .with_attempt(2)
//!     .with_timeout(Duration::from_millis(10));
//!
//! assert_eq!(ev.kind, EventKind::AttemptTimedOut);
//! assert_eq!(ev.timeout_ms, Some(10));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::core::WorkerId;
use crate::requests::{RequestId, RequestType};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (`subscriber=<name> info=<panic>`).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (`subscriber=<name> reason=<full|closed>`).
    SubscriberOverflow,

    // === Shutdown events ===
    /// `stop` was called (or an OS signal observed).
    ShutdownRequested,

    /// All workers exited before the stop deadline.
    AllStoppedWithin,

    /// Stop deadline exceeded; forced stop fired.
    ///
    /// Sets: `workers` (number still alive), `timeout_ms` (the deadline).
    GraceExceeded,

    // === Worker lifecycle ===
    /// Worker started its loop.
    ///
    /// Sets: `worker`, `workers` (worker count after start).
    WorkerStarted,

    /// Worker left its loop.
    ///
    /// Sets: `worker`, `reason` (`stop_signal`, `queue_closed`, `forced`).
    WorkerStopped,

    /// Scaler added a worker because the queue was above threshold.
    ///
    /// Sets: `load`, `workers` (count after scaling).
    ScaledUp,

    /// Scaler removed a worker because the queue was well below threshold.
    ///
    /// Sets: `load`, `workers` (count after scaling).
    ScaledDown,

    // === Request lifecycle ===
    /// Request was not queued (queue full or closed).
    ///
    /// Sets: `request`, `request_type`, `reason` (`queue_full` / `queue_closed`), `load`.
    RequestDropped,

    /// No handler registered for the request type; request abandoned.
    ///
    /// Sets: `worker`, `request`, `request_type`.
    HandlerMissing,

    /// Attempt is about to run.
    ///
    /// Sets: `worker`, `request`, `request_type`, `attempt` (1-based), `timeout_ms`.
    AttemptStarting,

    /// Attempt returned an error or panicked.
    ///
    /// Sets: `worker`, `request`, `request_type`, `attempt`, `reason`.
    AttemptFailed,

    /// Attempt exceeded its timeout.
    ///
    /// Sets: `worker`, `request`, `request_type`, `attempt`, `timeout_ms`.
    AttemptTimedOut,

    /// Request succeeded.
    ///
    /// Sets: `worker`, `request`, `request_type`, `attempt` (the successful one).
    RequestSucceeded,

    /// All attempts used up without success.
    ///
    /// Sets: `worker`, `request`, `request_type`, `attempt` (total attempts), `reason` (last error).
    RequestExhausted,

    /// Handler returned a fatal error; no retry.
    ///
    /// Sets: `worker`, `request`, `request_type`, `attempt`, `reason`.
    RequestRejected,

    /// Forced stop interrupted the retry sequence, or the pool stopped
    /// before any worker picked the request up.
    ///
    /// Sets: `request`, `request_type`, `attempt` (attempts made), `reason`;
    /// `worker` when a worker held the request.
    RequestAbandoned,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker involved, if any.
    pub worker: Option<WorkerId>,
    /// Request involved, if any.
    pub request: Option<RequestId>,
    /// Type tag of the request involved, if any.
    pub request_type: Option<RequestType>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Attempt timeout or stop deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Worker count at the time of the event.
    pub workers: Option<usize>,
    /// Queue depth at the time of the event.
    pub load: Option<usize>,
    /// Human-readable reason (errors, drop cause, exit cause).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            request: None,
            request_type: None,
            attempt: None,
            timeout_ms: None,
            workers: None,
            load: None,
            reason: None,
        }
    }

    /// Attaches a worker id.
    #[inline]
    pub fn with_worker(mut self, id: WorkerId) -> Self {
        self.worker = Some(id);
        self
    }

    /// Attaches a request id.
    #[inline]
    pub fn with_request(mut self, id: RequestId) -> Self {
        self.request = Some(id);
        self
    }

    /// Attaches a request type tag.
    #[inline]
    pub fn with_request_type(mut self, kind: RequestType) -> Self {
        self.request_type = Some(kind);
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches the current worker count.
    #[inline]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    /// Attaches the current queue depth.
    #[inline]
    pub fn with_load(mut self, n: usize) -> Self {
        self.load = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::WorkerStarted);
        let b = Event::new(EventKind::WorkerStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_is_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::GraceExceeded).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn overflow_reason_names_subscriber() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}
