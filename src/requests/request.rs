//! # Request: the unit of work submitted to the pool.
//!
//! A [`Request`] carries its type tag, payload, per-attempt timeout and retry
//! budget. `Duration::ZERO` as timeout means "use the pool default" (10ms unless
//! configured otherwise); the default is applied by the worker when the request
//! is processed, not at submission time.
//!
//! Submission is fire-and-forget. A caller that wants the terminal [`Outcome`]
//! converts the request with [`Request::tracked`] and awaits the [`Receipt`].
//!
//! ## Processing state machine
//! ```text
//! Pending ─► Attempting(1) ─┬─► Succeeded                       (terminal)
//!                           ├─► AttemptFailed   ─► Attempting(k+1)
//!                           ├─► AttemptTimedOut ─► Attempting(k+1)
//!                           └─► (k = max_retries + 1) ─► Exhausted (terminal)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::{AttemptError, ReceiptError};

/// Global sequence for request ids.
static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Request type tag selecting the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestType(pub u32);

impl From<u32> for RequestType {
    fn from(v: u32) -> Self {
        RequestType(v)
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type-{}", self.0)
    }
}

/// Process-wide unique request identity (diagnostics only).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    fn next() -> Self {
        RequestId(REQUEST_SEQ.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Terminal result of processing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A handler attempt succeeded.
    Succeeded {
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed or timed out.
    Exhausted {
        /// Attempts made (`max_retries + 1`).
        attempts: u32,
        /// Error of the final attempt.
        last_error: AttemptError,
    },
    /// Handler returned a non-retryable error.
    Rejected {
        /// Attempts made, including the rejected one.
        attempts: u32,
        /// The fatal error.
        error: AttemptError,
    },
    /// No handler registered for the request type.
    Unhandled,
    /// Forced shutdown interrupted the retry sequence.
    Abandoned {
        /// Attempts made before the forced stop.
        attempts: u32,
    },
}

impl Outcome {
    /// True for [`Outcome::Succeeded`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }

    /// Number of handler attempts made.
    pub fn attempts(&self) -> u32 {
        match self {
            Outcome::Succeeded { attempts }
            | Outcome::Exhausted { attempts, .. }
            | Outcome::Rejected { attempts, .. }
            | Outcome::Abandoned { attempts } => *attempts,
            Outcome::Unhandled => 0,
        }
    }
}

/// Awaitable handle for the [`Outcome`] of a tracked request.
#[derive(Debug)]
pub struct Receipt {
    id: RequestId,
    rx: oneshot::Receiver<Outcome>,
}

impl Receipt {
    /// Id of the tracked request.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Waits for the request to reach a terminal state.
    ///
    /// Returns [`ReceiptError::Discarded`] if the request was dropped (queue full,
    /// pool stopped) or the pool went away before processing it.
    pub async fn outcome(self) -> Result<Outcome, ReceiptError> {
        self.rx.await.map_err(|_| ReceiptError::Discarded)
    }
}

/// Unit of work submitted to the pool.
pub struct Request<P> {
    id: RequestId,
    kind: RequestType,
    payload: P,
    timeout: Duration,
    max_retries: u32,
    completion: Option<oneshot::Sender<Outcome>>,
}

impl<P> Request<P> {
    /// Creates a request with default timeout and no retries.
    pub fn new(kind: RequestType, payload: P) -> Self {
        Self {
            id: RequestId::next(),
            kind,
            payload,
            timeout: Duration::ZERO,
            max_retries: 0,
            completion: None,
        }
    }

    /// Sets the per-attempt timeout (`Duration::ZERO` = pool default).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of extra attempts after the first failure/timeout.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Attaches a completion channel and returns the matching [`Receipt`].
    pub fn tracked(mut self) -> (Self, Receipt) {
        let (tx, rx) = oneshot::channel();
        self.completion = Some(tx);
        let receipt = Receipt { id: self.id, rx };
        (self, receipt)
    }

    /// Request identity.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Type tag.
    pub fn kind(&self) -> RequestType {
        self.kind
    }

    /// Payload reference.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Per-attempt timeout as given (`ZERO` = pool default).
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry budget.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts allowed (`max_retries + 1`, saturating).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// True if a [`Receipt`] is waiting on this request.
    pub fn is_tracked(&self) -> bool {
        self.completion.is_some()
    }

    pub(crate) fn into_parts(self) -> (RequestMeta, P, Option<oneshot::Sender<Outcome>>) {
        let meta = RequestMeta {
            id: self.id,
            kind: self.kind,
            timeout: self.timeout,
            max_attempts: self.max_attempts(),
        };
        (meta, self.payload, self.completion)
    }
}

impl<P> fmt::Debug for Request<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("tracked", &self.is_tracked())
            .finish_non_exhaustive()
    }
}

/// Everything a worker needs about a request apart from its payload.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RequestMeta {
    pub id: RequestId,
    pub kind: RequestType,
    pub timeout: Duration,
    pub max_attempts: u32,
}
