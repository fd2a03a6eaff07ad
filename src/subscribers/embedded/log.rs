//! # LogWriter: tracing-backed event printer
//!
//! A subscriber that renders every [`Event`] through [`tracing`] with
//! structured fields. Install any `tracing` subscriber (for example
//! `tracing_subscriber::fmt`) to see the output.
//!
//! ## Levels
//! - `info`: worker start/stop, scaling, shutdown milestones
//! - `warn`: drops, attempt failures/timeouts, exhaustion, missing handlers, grace exceeded
//! - `debug`: attempt starts and successes
//! - `error`: subscriber panics, fatal handler errors
//!
//! ## Example output (fmt layer)
//! ```text
//!  INFO dynapool: worker started worker=worker-0 workers=1
//!  WARN dynapool: attempt timed out worker=worker-0 request=req-3 attempt=1 timeout_ms=10
//!  WARN dynapool: request dropped request=req-9 reason=queue_full load=10
//!  INFO dynapool: scaled up load=41 workers=4
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Tracing target used for all records emitted by [`LogWriter`].
pub const LOG_TARGET: &str = "dynapool";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let worker = e.worker.map(|w| w.to_string());
        let worker = worker.as_deref();
        let request = e.request.map(|r| r.to_string());
        let request = request.as_deref();
        let request_type = e.request_type.map(|t| t.0);
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::WorkerStarted => {
                info!(target: LOG_TARGET, worker, workers = e.workers, "worker started");
            }
            EventKind::WorkerStopped => {
                info!(target: LOG_TARGET, worker, reason, "worker stopped");
            }
            EventKind::ScaledUp => {
                info!(target: LOG_TARGET, load = e.load, workers = e.workers, "scaled up");
            }
            EventKind::ScaledDown => {
                info!(target: LOG_TARGET, load = e.load, workers = e.workers, "scaled down");
            }
            EventKind::RequestDropped => {
                warn!(target: LOG_TARGET, request, request_type, reason, load = e.load, "request dropped");
            }
            EventKind::HandlerMissing => {
                warn!(target: LOG_TARGET, worker, request, request_type, "handler not implemented");
            }
            EventKind::AttemptStarting => {
                debug!(target: LOG_TARGET, worker, request, request_type, attempt = e.attempt, timeout_ms = e.timeout_ms, "attempt starting");
            }
            EventKind::AttemptFailed => {
                warn!(target: LOG_TARGET, worker, request, attempt = e.attempt, reason, "attempt failed");
            }
            EventKind::AttemptTimedOut => {
                warn!(target: LOG_TARGET, worker, request, attempt = e.attempt, timeout_ms = e.timeout_ms, "attempt timed out");
            }
            EventKind::RequestSucceeded => {
                debug!(target: LOG_TARGET, worker, request, attempt = e.attempt, "request succeeded");
            }
            EventKind::RequestExhausted => {
                warn!(target: LOG_TARGET, worker, request, attempts = e.attempt, reason, "request failed after all retries");
            }
            EventKind::RequestRejected => {
                error!(target: LOG_TARGET, worker, request, attempt = e.attempt, reason, "request rejected by handler");
            }
            EventKind::RequestAbandoned => {
                warn!(target: LOG_TARGET, worker, request, attempts = e.attempt, reason, "request abandoned");
            }
            EventKind::ShutdownRequested => {
                info!(target: LOG_TARGET, "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!(target: LOG_TARGET, "all workers stopped gracefully");
            }
            EventKind::GraceExceeded => {
                warn!(target: LOG_TARGET, workers = e.workers, grace_ms = e.timeout_ms, "stop deadline reached, forcing shutdown");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: LOG_TARGET, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(target: LOG_TARGET, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
