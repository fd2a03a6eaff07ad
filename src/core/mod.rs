//! Runtime core: dispatcher, workers and lifecycle.
//!
//! The public entry point is [`Dispatcher`], which owns the request queue,
//! spawns and retires workers, runs the scaling loop and performs graceful
//! shutdown. Everything else here is plumbing between the dispatcher and its
//! workers.
//!
//! Internal modules:
//! - [`config`]: pool-wide settings and their validation;
//! - [`builder`]: assembles bus, subscribers and dispatcher;
//! - [`dispatcher`]: queue, worker add/remove, scaling loop, stop;
//! - [`worker`]: one worker's receive loop and the per-request retry state machine;
//! - [`runner`]: executes one attempt with timeout and cancellation;
//! - [`state`]: worker-count accounting under a mutex;
//! - [`metrics`]: exact counters behind [`PoolMetrics`];
//! - [`shutdown`]: cross-platform shutdown signal handling.

use std::fmt;

mod builder;
mod config;
mod dispatcher;
mod metrics;
mod runner;
mod shutdown;
mod state;
mod worker;

pub use builder::PoolBuilder;
pub use config::PoolConfig;
pub use dispatcher::Dispatcher;
pub use metrics::PoolMetrics;

/// Identity of one worker, unique for the lifetime of its pool.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub u64);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

impl fmt::Debug for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
