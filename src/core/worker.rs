//! # Worker: one competing consumer of the request queue.
//!
//! A worker races three sources on every iteration:
//! ```text
//! loop {
//!   select! {
//!     queue.recv()  ─► Ok(req)  → process(req) → yield_now()
//!                  └► Err      → exit (queue closed and drained)
//!     stop.recv()   ─► Ok(())   → exit (one worker per stop signal)
//!     force.cancelled()         → exit (forced shutdown)
//!   }
//! }
//! ```
//!
//! ## Per-request state machine
//! ```text
//! registry.get(type) ── None ─► HandlerMissing → Outcome::Unhandled
//!        │
//!   for attempt in 1..=max_retries+1:
//!        ├─ force cancelled?        → RequestAbandoned → Outcome::Abandoned
//!        ├─ AttemptStarting
//!        ├─ run_attempt()
//!        │    ├─ Ok                  → RequestSucceeded → Outcome::Succeeded
//!        │    ├─ Err(fatal)          → AttemptFailed, RequestRejected → Outcome::Rejected
//!        │    └─ Err(retryable)      → AttemptFailed | AttemptTimedOut → next attempt
//!   budget spent                     → RequestExhausted → Outcome::Exhausted
//! ```
//!
//! ## Rules
//! - A worker processes **one request at a time**; attempts run sequentially
//! - Retries are immediate (no backoff between attempts)
//! - Counters are updated before the outcome reaches the request's receipt

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::core::metrics::Counters;
use crate::core::runner::run_attempt;
use crate::core::state::PoolState;
use crate::core::WorkerId;
use crate::error::AttemptError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::TimeoutPolicy;
use crate::requests::{HandlerRegistry, Outcome, Request, RequestMeta};

/// Everything a worker shares with the dispatcher and its sibling workers.
pub(crate) struct WorkerContext<P> {
    /// Shared request queue (competing consumers).
    pub queue: Receiver<Request<P>>,
    /// Per-worker stop signals; each message retires exactly one worker.
    pub stop: Receiver<()>,
    /// Pool-wide forced-stop token.
    pub force: CancellationToken,
    pub handlers: Arc<HandlerRegistry<P>>,
    pub bus: Bus,
    pub counters: Arc<Counters>,
    pub state: Arc<PoolState>,
    /// Timeout used for requests submitted with `Duration::ZERO`.
    pub default_timeout: Duration,
    pub timeout_policy: TimeoutPolicy,
}

/// Why a worker left its loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// Consumed a stop signal.
    StopSignal,
    /// Queue closed and drained.
    QueueClosed,
    /// Forced-stop token fired.
    Forced,
}

impl WorkerExit {
    pub fn as_label(self) -> &'static str {
        match self {
            WorkerExit::StopSignal => "stop_signal",
            WorkerExit::QueueClosed => "queue_closed",
            WorkerExit::Forced => "forced",
        }
    }
}

/// One worker bound to the shared context.
pub(crate) struct Worker<P> {
    id: WorkerId,
    ctx: Arc<WorkerContext<P>>,
}

impl<P> Worker<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(id: WorkerId, ctx: Arc<WorkerContext<P>>) -> Self {
        Self { id, ctx }
    }

    /// Runs the receive loop until a stop signal, queue closure or forced stop.
    pub async fn run(self) -> WorkerExit {
        let ctx = Arc::clone(&self.ctx);
        ctx.bus.publish(
            Event::new(EventKind::WorkerStarted)
                .with_worker(self.id)
                .with_workers(ctx.state.count()),
        );

        let mut stop_open = true;
        let exit = loop {
            if ctx.force.is_cancelled() {
                break WorkerExit::Forced;
            }
            select! {
                res = ctx.queue.recv() => match res {
                    Ok(req) => {
                        self.process(req).await;
                        tokio::task::yield_now().await;
                    }
                    Err(_) => break WorkerExit::QueueClosed,
                },
                res = ctx.stop.recv(), if stop_open => match res {
                    Ok(()) => break WorkerExit::StopSignal,
                    // Dispatcher is gone; keep draining the queue.
                    Err(_) => stop_open = false,
                },
                _ = ctx.force.cancelled() => break WorkerExit::Forced,
            }
        };

        let remaining = match exit {
            WorkerExit::StopSignal => ctx.state.on_stop_consumed(self.id),
            WorkerExit::QueueClosed | WorkerExit::Forced => ctx.state.on_exit(self.id),
        };
        ctx.bus.publish(
            Event::new(EventKind::WorkerStopped)
                .with_worker(self.id)
                .with_workers(remaining)
                .with_reason(exit.as_label()),
        );
        exit
    }

    /// Processes one request to its terminal outcome and reports it.
    async fn process(&self, req: Request<P>) {
        let (meta, payload, completion) = req.into_parts();
        let outcome = self.execute(meta, payload).await;

        self.ctx.counters.record_outcome(&outcome);
        self.publish_outcome(&meta, &outcome);
        if let Some(tx) = completion {
            let _ = tx.send(outcome);
        }
    }

    async fn execute(&self, meta: RequestMeta, payload: P) -> Outcome {
        let ctx = &self.ctx;
        let Some(handler) = ctx.handlers.get(meta.kind) else {
            return Outcome::Unhandled;
        };
        let timeout = if meta.timeout.is_zero() {
            ctx.default_timeout
        } else {
            meta.timeout
        };
        let payload = Arc::new(payload);
        let mut last_error: Option<AttemptError> = None;

        for attempt in 1..=meta.max_attempts {
            if ctx.force.is_cancelled() {
                return Outcome::Abandoned {
                    attempts: attempt - 1,
                };
            }
            ctx.bus.publish(
                self.request_event(EventKind::AttemptStarting, &meta)
                    .with_attempt(attempt)
                    .with_timeout(timeout),
            );

            let err = match run_attempt(handler, &payload, timeout, ctx.timeout_policy, &ctx.force)
                .await
            {
                Ok(()) => return Outcome::Succeeded { attempts: attempt },
                Err(e) => e,
            };

            ctx.counters.record_attempt_error(err.is_timeout());
            let kind = if err.is_timeout() {
                EventKind::AttemptTimedOut
            } else {
                EventKind::AttemptFailed
            };
            ctx.bus.publish(
                self.request_event(kind, &meta)
                    .with_attempt(attempt)
                    .with_timeout(timeout)
                    .with_reason(err.to_string()),
            );

            if !err.is_retryable() {
                return Outcome::Rejected {
                    attempts: attempt,
                    error: err,
                };
            }
            last_error = Some(err);
        }

        match last_error {
            Some(last_error) => Outcome::Exhausted {
                attempts: meta.max_attempts,
                last_error,
            },
            None => Outcome::Abandoned { attempts: 0 },
        }
    }

    fn request_event(&self, kind: EventKind, meta: &RequestMeta) -> Event {
        Event::new(kind)
            .with_worker(self.id)
            .with_request(meta.id)
            .with_request_type(meta.kind)
    }

    /// Publishes the single terminal event of a request.
    fn publish_outcome(&self, meta: &RequestMeta, outcome: &Outcome) {
        let ev = match outcome {
            Outcome::Succeeded { attempts } => self
                .request_event(EventKind::RequestSucceeded, meta)
                .with_attempt(*attempts),
            Outcome::Exhausted {
                attempts,
                last_error,
            } => self
                .request_event(EventKind::RequestExhausted, meta)
                .with_attempt(*attempts)
                .with_reason(last_error.to_string()),
            Outcome::Rejected { attempts, error } => self
                .request_event(EventKind::RequestRejected, meta)
                .with_attempt(*attempts)
                .with_reason(error.to_string()),
            Outcome::Unhandled => self
                .request_event(EventKind::HandlerMissing, meta)
                .with_reason("handler not implemented"),
            Outcome::Abandoned { attempts } => self
                .request_event(EventKind::RequestAbandoned, meta)
                .with_attempt(*attempts)
                .with_reason("forced shutdown"),
        };
        self.ctx.bus.publish(ev);
    }
}
