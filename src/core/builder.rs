//! # Builder for a [`Dispatcher`].
//!
//! Wires the pieces a pool needs before any worker runs:
//! - event [`Bus`] and the [`SubscriberSet`] fed from it,
//! - the bounded request queue and the stop-signal channel,
//! - the shared worker context (registry, counters, accounting).
//!
//! `build` validates the configuration and must be called inside a tokio
//! runtime (it spawns the subscriber workers). The pool is idle until
//! [`Dispatcher::start`] is called.

use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::PoolConfig;
use crate::core::dispatcher::Dispatcher;
use crate::core::metrics::Counters;
use crate::core::state::PoolState;
use crate::core::worker::WorkerContext;
use crate::error::RuntimeError;
use crate::events::Bus;
use crate::requests::{HandlerRegistry, Request};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Dispatcher`].
pub struct PoolBuilder<P> {
    cfg: PoolConfig,
    handlers: HandlerRegistry<P>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<P> Dispatcher<P>
where
    P: Send + Sync + 'static,
{
    /// Starts building a pool with the given configuration.
    pub fn builder(cfg: PoolConfig) -> PoolBuilder<P> {
        PoolBuilder::new(cfg)
    }
}

impl<P> PoolBuilder<P>
where
    P: Send + Sync + 'static,
{
    /// Creates a builder with no handlers and no subscribers.
    pub fn new(cfg: PoolConfig) -> Self {
        Self {
            cfg,
            handlers: HandlerRegistry::new(),
            subscribers: Vec::new(),
        }
    }

    /// Sets the request-type → handler mapping shared by all workers.
    pub fn with_handlers(mut self, handlers: HandlerRegistry<P>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets its own worker and bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and assembles the pool.
    pub fn build(self) -> Result<Arc<Dispatcher<P>>, RuntimeError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let listener = subscriber_listener(&bus, subs);

        let (queue_tx, queue_rx) = async_channel::bounded::<Request<P>>(self.cfg.queue_capacity);
        let (stop_tx, stop_rx) = async_channel::bounded::<()>(self.cfg.max_workers);

        let ctx = Arc::new(WorkerContext {
            queue: queue_rx,
            stop: stop_rx,
            force: CancellationToken::new(),
            handlers: Arc::new(self.handlers),
            bus,
            counters: Arc::new(Counters::default()),
            state: Arc::new(PoolState::new()),
            default_timeout: self.cfg.default_timeout,
            timeout_policy: self.cfg.timeout_policy,
        });

        Ok(Arc::new(Dispatcher::new_internal(
            self.cfg, queue_tx, stop_tx, ctx, listener,
        )))
    }
}

/// Forwards bus events to the subscriber set until the returned token is cancelled.
///
/// On cancellation the backlog is delivered, then the subscribers drain and stop.
fn subscriber_listener(bus: &Bus, set: SubscriberSet) -> (CancellationToken, JoinHandle<()>) {
    let mut rx = bus.subscribe();
    let token = CancellationToken::new();
    let done = token.clone();

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = done.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => set.emit(&ev),
                            Err(TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    });
    (token, handle)
}
