//! Error types used by the dynapool runtime, its workers and handlers.
//!
//! - [`HandlerError`]: returned by request handlers.
//! - [`AttemptError`]: the outcome of one failed attempt (handler error, timeout, panic).
//! - [`SubmitError`]: returned by [`Dispatcher::try_submit`](crate::Dispatcher::try_submit).
//! - [`ReceiptError`]: returned by [`Receipt::outcome`](crate::Receipt::outcome).
//! - [`RuntimeError`]: raised by administrative pool operations.
//!
//! All enums provide `as_label` (stable snake_case label for logs/metrics).

use std::time::Duration;
use thiserror::Error;

use crate::core::WorkerId;

/// # Errors produced by the pool runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Stop deadline was exceeded; the listed workers were still alive and had to be force-stopped.
    #[error("shutdown timeout {grace:?} exceeded; stuck workers: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The deadline given to `stop`.
        grace: Duration,
        /// Workers still alive when the deadline expired.
        stuck: Vec<WorkerId>,
    },

    /// Pool configuration is inconsistent.
    #[error("invalid pool config: {reason}")]
    InvalidConfig {
        /// What is wrong with the config.
        reason: String,
    },

    /// Administrative call on a pool that has been stopped.
    #[error("pool is shut down")]
    Closed,

    /// Adding a worker would exceed `max_workers`.
    #[error("worker pool at capacity ({max} workers)")]
    AtCapacity {
        /// Configured maximum worker count.
        max: usize,
    },

    /// OS signal listeners could not be registered.
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dynapool::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
            RuntimeError::Closed => "runtime_closed",
            RuntimeError::AtCapacity { .. } => "runtime_at_capacity",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}

/// # Errors returned by request handlers.
///
/// `Fail` is retried up to the request's budget, `Fatal` ends the request immediately.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error (never retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`HandlerError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        HandlerError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Fatal { .. } => "handler_fatal",
        }
    }
}

/// # Why a single attempt did not succeed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Handler returned an error.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// Attempt exceeded its timeout. The handler task is not awaited any further.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The per-attempt timeout that was exceeded.
        timeout: Duration,
    },

    /// Handler task panicked.
    #[error("handler panicked: {reason}")]
    Panicked {
        /// Panic message, if it could be extracted.
        reason: String,
    },
}

impl AttemptError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dynapool::AttemptError;
    /// use std::time::Duration;
    ///
    /// let err = AttemptError::Timeout { timeout: Duration::from_millis(10) };
    /// assert_eq!(err.as_label(), "attempt_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptError::Handler(e) => e.as_label(),
            AttemptError::Timeout { .. } => "attempt_timeout",
            AttemptError::Panicked { .. } => "attempt_panicked",
        }
    }

    /// Indicates whether another attempt may be made.
    ///
    /// Everything except [`HandlerError::Fatal`] is retryable.
    ///
    /// # Example
    /// ```
    /// use dynapool::{AttemptError, HandlerError};
    ///
    /// assert!(AttemptError::from(HandlerError::fail("boom")).is_retryable());
    /// assert!(!AttemptError::from(HandlerError::fatal("nope")).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptError::Handler(HandlerError::Fatal { .. }))
    }

    /// True if this attempt ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::Timeout { .. })
    }
}

/// # Errors returned when a request cannot be queued.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Queue is full; the request was dropped.
    #[error("request queue full (capacity {capacity}); request dropped")]
    Full {
        /// Queue capacity.
        capacity: usize,
    },

    /// Pool has been stopped; the request was dropped.
    #[error("request queue closed; request dropped")]
    Closed,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Full { .. } => "queue_full",
            SubmitError::Closed => "queue_closed",
        }
    }
}

/// # Errors returned while waiting on a [`Receipt`](crate::Receipt).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptError {
    /// The request was dropped before any worker produced an outcome.
    #[error("request discarded before completion")]
    Discarded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(RuntimeError::Closed.as_label(), "runtime_closed");
        assert_eq!(
            RuntimeError::AtCapacity { max: 3 }.as_label(),
            "runtime_at_capacity"
        );
        assert_eq!(SubmitError::Full { capacity: 1 }.as_label(), "queue_full");
        assert_eq!(SubmitError::Closed.as_label(), "queue_closed");
        assert_eq!(
            AttemptError::from(HandlerError::fail("x")).as_label(),
            "handler_failed"
        );
        assert_eq!(
            AttemptError::Panicked { reason: "x".into() }.as_label(),
            "attempt_panicked"
        );
    }

    #[test]
    fn timeouts_and_panics_are_retryable() {
        assert!(AttemptError::Timeout {
            timeout: Duration::from_millis(1)
        }
        .is_retryable());
        assert!(AttemptError::Panicked { reason: "x".into() }.is_retryable());
    }

    #[test]
    fn handler_error_display_is_transparent() {
        let err = AttemptError::from(HandlerError::fail("disk full"));
        assert_eq!(err.to_string(), "execution failed: disk full");
    }

    #[test]
    fn grace_exceeded_lists_stuck_workers() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_millis(5),
            stuck: vec![WorkerId(2), WorkerId(7)],
        };
        let msg = err.to_string();
        assert!(msg.contains("worker-2"), "{msg}");
        assert!(msg.contains("worker-7"), "{msg}");
    }
}
