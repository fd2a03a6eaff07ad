//! # Dispatcher: bounded queue, dynamic workers, scaling loop and shutdown.
//!
//! The [`Dispatcher`] owns the request queue and every worker consuming it.
//! Requests are submitted without blocking; the scaling loop samples the queue
//! depth and adds or removes one worker per tick.
//!
//! ## Architecture
//! ```text
//! submit(req) ──try_send──► [bounded queue] ──► worker 1 ─┐
//!      │                        │  len()   ├──► worker 2 ─┼─► handler(payload, ctx)
//!      └─ full/closed ─► drop   │          └──► worker N ─┘
//!         (counted + RequestDropped)
//!                               │
//! scaler tick ── load = len() ──┴─► ScalePolicy::decide(load, count)
//!                                     ├─ Grow   → add_worker()
//!                                     ├─ Shrink → remove_worker(min) ──► [stop channel] ─► one worker exits
//!                                     └─ Hold
//!
//! stop(grace):
//!   ShutdownRequested → close pool + queue → cancel scaler
//!   wait(workers) up to grace
//!     ├─ all exited      → AllStoppedWithin → Ok(())
//!     └─ deadline passed → GraceExceeded → force.cancel() → wait(workers)
//!                          → Err(GraceExceeded { stuck })
//! ```
//!
//! ## Rules
//! - The queue is the only backpressure: a full queue drops, it never blocks
//! - Every drop is counted and reported exactly once
//! - `workerCount` changes under one mutex; stop signals are sent outside it
//! - After `stop` no request reaches a worker and no worker is added

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_channel::{Sender, TrySendError};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::config::PoolConfig;
use crate::core::metrics::PoolMetrics;
use crate::core::shutdown;
use crate::core::state::PoolState;
use crate::core::worker::{Worker, WorkerContext};
use crate::core::WorkerId;
use crate::error::{RuntimeError, SubmitError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{ScaleDecision, ScalePolicy};
use crate::requests::{Outcome, Request};

/// Owner of the request queue and of the worker lifecycle.
///
/// Built with [`Dispatcher::builder`]; always handled through `Arc`.
pub struct Dispatcher<P> {
    cfg: PoolConfig,
    queue: Sender<Request<P>>,
    stop_tx: Sender<()>,
    ctx: Arc<WorkerContext<P>>,
    /// Completion tracker of worker tasks.
    tracker: TaskTracker,
    /// Cancels the scaling loop.
    runtime_token: CancellationToken,
    /// Result of the shutdown; `Some` holds the grace and stuck workers when it was exceeded.
    stopped: OnceCell<Option<(Duration, Vec<WorkerId>)>>,
    /// Bus → subscribers forwarder, flushed at the end of `stop`.
    listener: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl<P> Dispatcher<P>
where
    P: Send + Sync + 'static,
{
    pub(crate) fn new_internal(
        cfg: PoolConfig,
        queue: Sender<Request<P>>,
        stop_tx: Sender<()>,
        ctx: Arc<WorkerContext<P>>,
        listener: (CancellationToken, JoinHandle<()>),
    ) -> Self {
        Self {
            cfg,
            queue,
            stop_tx,
            ctx,
            tracker: TaskTracker::new(),
            runtime_token: CancellationToken::new(),
            stopped: OnceCell::new(),
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.cfg
    }

    /// Event bus of this pool.
    pub fn bus(&self) -> &Bus {
        &self.ctx.bus
    }

    /// Current worker count (live workers minus pending stop signals).
    pub fn worker_count(&self) -> usize {
        self.ctx.state.count()
    }

    /// Current queue depth.
    pub fn load(&self) -> usize {
        self.queue.len()
    }

    /// Ids of the workers that have not exited yet.
    pub fn live_workers(&self) -> Vec<WorkerId> {
        self.ctx.state.snapshot()
    }

    /// True once `stop` has been called.
    pub fn is_closed(&self) -> bool {
        self.ctx.state.is_closed()
    }

    /// Snapshot of the pool counters.
    pub fn metrics(&self) -> PoolMetrics {
        self.ctx
            .counters
            .snapshot(self.worker_count(), self.queue.len())
    }

    /// Adds `min_workers` workers and launches the scaling loop.
    pub fn start(self: &Arc<Self>) -> Result<(), RuntimeError> {
        for _ in self.worker_count()..self.cfg.min_workers {
            self.add_worker()?;
        }
        self.spawn_scaler();
        Ok(())
    }

    // ---- submission ----

    /// Enqueues `req` without blocking; drops it when the queue is full or closed.
    ///
    /// The drop is observable through [`PoolMetrics::dropped`], a
    /// [`EventKind::RequestDropped`] event and, for tracked requests, a
    /// discarded receipt.
    pub fn submit(&self, req: Request<P>) {
        let _ = self.try_submit(req);
    }

    /// Like [`submit`](Self::submit) but tells the caller whether the request was queued.
    pub fn try_submit(&self, req: Request<P>) -> Result<(), SubmitError> {
        self.ctx.counters.record_submitted();
        let (id, kind) = (req.id(), req.kind());

        let err = match self.queue.try_send(req) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(_)) => SubmitError::Full {
                capacity: self.cfg.queue_capacity,
            },
            Err(TrySendError::Closed(_)) => SubmitError::Closed,
        };

        self.ctx.counters.record_dropped();
        self.ctx.bus.publish(
            Event::new(EventKind::RequestDropped)
                .with_request(id)
                .with_request_type(kind)
                .with_load(self.queue.len())
                .with_reason(err.as_label()),
        );
        Err(err)
    }

    // ---- worker management ----

    /// Registers and launches one worker bound to the shared queue and stop channel.
    ///
    /// Fails with [`RuntimeError::AtCapacity`] when `max_workers` workers are
    /// alive and with [`RuntimeError::Closed`] after `stop`.
    pub fn add_worker(&self) -> Result<WorkerId, RuntimeError> {
        let id = self.ctx.state.admit(self.cfg.max_workers)?;
        let worker = Worker::new(id, Arc::clone(&self.ctx));
        self.tracker.spawn(worker.run());
        Ok(id)
    }

    /// Retires one worker if the count is above `min_workers`.
    ///
    /// Returns `true` if a stop signal was sent. The signal is consumed by
    /// whichever worker next becomes idle.
    pub fn remove_worker(&self, min_workers: usize) -> bool {
        if !self.ctx.state.begin_remove(min_workers) {
            return false;
        }
        match self.stop_tx.try_send(()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "stop signal not delivered");
                self.ctx.state.cancel_remove();
                false
            }
        }
    }

    // ---- scaling ----

    /// Evaluates `policy` once and applies its decision.
    ///
    /// Returns the decision actually applied: a `Grow` that hits capacity or a
    /// `Shrink` that loses a race reports `Hold`.
    pub fn scale_once(&self, policy: &ScalePolicy) -> ScaleDecision {
        let load = self.queue.len();
        match policy.decide(load, self.worker_count()) {
            ScaleDecision::Grow => match self.add_worker() {
                Ok(id) => {
                    self.ctx.bus.publish(
                        Event::new(EventKind::ScaledUp)
                            .with_worker(id)
                            .with_workers(self.worker_count())
                            .with_load(load),
                    );
                    ScaleDecision::Grow
                }
                Err(e) => {
                    tracing::debug!(error = %e, label = e.as_label(), "scale up skipped");
                    ScaleDecision::Hold
                }
            },
            ScaleDecision::Shrink if self.remove_worker(policy.min_workers) => {
                self.ctx.bus.publish(
                    Event::new(EventKind::ScaledDown)
                        .with_workers(self.worker_count())
                        .with_load(load),
                );
                ScaleDecision::Shrink
            }
            ScaleDecision::Shrink | ScaleDecision::Hold => ScaleDecision::Hold,
        }
    }

    /// Runs the scaling loop until `token` is cancelled.
    ///
    /// Ticks every `policy.interval`; missed ticks are skipped rather than bursted.
    pub async fn scale_workers(&self, policy: ScalePolicy, token: CancellationToken) {
        let mut ticker = time::interval(policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if self.is_closed() {
                        break;
                    }
                    self.scale_once(&policy);
                }
            }
        }
    }

    /// Spawns the scaling loop with the configured policy, bound to the pool lifetime.
    pub fn spawn_scaler(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let token = self.runtime_token.child_token();
        let policy = self.cfg.scale_policy();
        tokio::spawn(async move { this.scale_workers(policy, token).await })
    }

    // ---- shutdown ----

    /// Graceful shutdown bounded by `grace`.
    ///
    /// Closes the queue (already-queued requests stay visible to workers),
    /// stops the scaler and waits for every worker to drain and exit. When
    /// `grace` passes first, the forced-stop token fires: idle workers exit at
    /// once and busy workers exit after their current attempt. `stop` then
    /// waits for all of them and returns [`RuntimeError::GraceExceeded`]
    /// listing the workers that were still alive at the deadline.
    ///
    /// The shutdown runs once. Concurrent and later calls wait for it and
    /// return its result; their own `grace` is ignored.
    pub async fn stop(&self, grace: Duration) -> Result<(), RuntimeError> {
        match self.stopped.get_or_init(|| self.drive_stop(grace)).await {
            None => Ok(()),
            Some((grace, stuck)) => Err(RuntimeError::GraceExceeded {
                grace: *grace,
                stuck: stuck.clone(),
            }),
        }
    }

    async fn drive_stop(&self, grace: Duration) -> Option<(Duration, Vec<WorkerId>)> {
        self.ctx.bus.publish(
            Event::new(EventKind::ShutdownRequested)
                .with_workers(self.worker_count())
                .with_load(self.queue.len()),
        );
        self.ctx.state.close();
        self.queue.close();
        self.runtime_token.cancel();
        self.tracker.close();

        let exceeded = match time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.ctx.bus.publish(Event::new(EventKind::AllStoppedWithin));
                None
            }
            Err(_elapsed) => {
                let stuck = self.ctx.state.snapshot();
                self.ctx.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_workers(stuck.len())
                        .with_timeout(grace),
                );
                self.ctx.force.cancel();
                self.tracker.wait().await;
                Some((grace, stuck))
            }
        };

        self.abandon_leftovers();
        self.flush_subscribers().await;
        exceeded
    }

    /// [`stop`](Self::stop) with the configured `grace`.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.stop(self.cfg.grace).await
    }

    /// Waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C off Unix), then shuts down.
    pub async fn stop_on_signal(&self) -> Result<(), RuntimeError> {
        shutdown::wait_for_shutdown_signal().await?;
        self.shutdown().await
    }

    /// Abandons requests no worker picked up (pool ran with zero workers).
    fn abandon_leftovers(&self) {
        while let Ok(req) = self.ctx.queue.try_recv() {
            let (meta, _payload, completion) = req.into_parts();
            let outcome = Outcome::Abandoned { attempts: 0 };
            self.ctx.counters.record_outcome(&outcome);
            self.ctx.bus.publish(
                Event::new(EventKind::RequestAbandoned)
                    .with_request(meta.id)
                    .with_request_type(meta.kind)
                    .with_attempt(0)
                    .with_reason("pool stopped before pickup"),
            );
            if let Some(tx) = completion {
                let _ = tx.send(outcome);
            }
        }
    }

    /// Delivers every event published so far to the subscribers, then stops them.
    async fn flush_subscribers(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((token, handle)) = listener {
            token.cancel();
            let _ = handle.await;
        }
    }
}

