//! # Pool configuration.
//!
//! Provides [`PoolConfig`], the settings a [`Dispatcher`](crate::Dispatcher) is
//! built from. All fields are public; [`PoolConfig::validate`] is run by the
//! builder before anything is spawned.
//!
//! ## Sentinel values
//! - `Request::timeout == 0s` → `default_timeout` is used for every attempt
//! - `bus_capacity` is clamped to at least 1
//! - `min_workers = 0` is allowed: the pool idles with no workers until load grows

use std::time::Duration;

use crate::error::RuntimeError;
use crate::policies::{ScalePolicy, TimeoutPolicy};

/// Global configuration of one worker pool.
///
/// ## Field semantics
/// - `queue_capacity`: bound of the request queue; submissions beyond it are dropped
/// - `min_workers` / `max_workers`: bounds for the worker count
/// - `load_threshold`: queue depth above which the scaler adds a worker
/// - `scale_interval`: time between two scaler ticks
/// - `grace`: stop deadline used by [`Dispatcher::shutdown`](crate::Dispatcher::shutdown)
/// - `default_timeout`: per-attempt timeout for requests that leave it at zero
/// - `timeout_policy`: detach or abort timed-out handler tasks
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Capacity of the bounded request queue.
    pub queue_capacity: usize,

    /// Worker count the pool starts with and never shrinks below.
    pub min_workers: usize,

    /// Worker count the pool never grows past.
    ///
    /// Also bounds the stop-signal channel.
    pub max_workers: usize,

    /// Queue depth that triggers growth; shrinking starts below 75% of it.
    pub load_threshold: usize,

    /// Poll interval of the scaling loop.
    pub scale_interval: Duration,

    /// Maximum time `shutdown()` waits for workers before forcing them.
    pub grace: Duration,

    /// Per-attempt timeout applied when a request carries `Duration::ZERO`.
    pub default_timeout: Duration,

    /// What happens to a handler task whose attempt timed out.
    pub timeout_policy: TimeoutPolicy,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Receivers lagging behind more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,
}

impl PoolConfig {
    /// Checks that the configuration can build a working pool.
    ///
    /// # Example
    /// ```
    /// use dynapool::PoolConfig;
    ///
    /// let mut cfg = PoolConfig::default();
    /// assert!(cfg.validate().is_ok());
    ///
    /// cfg.min_workers = 9;
    /// cfg.max_workers = 4;
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), RuntimeError> {
        let reason = if self.queue_capacity == 0 {
            "queue_capacity must be at least 1".to_string()
        } else if self.max_workers == 0 {
            "max_workers must be at least 1".to_string()
        } else if self.min_workers > self.max_workers {
            format!(
                "min_workers ({}) exceeds max_workers ({})",
                self.min_workers, self.max_workers
            )
        } else if self.scale_interval.is_zero() {
            "scale_interval must be non-zero".to_string()
        } else {
            return Ok(());
        };
        Err(RuntimeError::InvalidConfig { reason })
    }

    /// Scaling policy derived from the worker bounds, threshold and interval.
    #[inline]
    pub fn scale_policy(&self) -> ScalePolicy {
        ScalePolicy {
            min_workers: self.min_workers,
            max_workers: self.max_workers,
            load_threshold: self.load_threshold,
            interval: self.scale_interval,
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `queue_capacity = 1024`
    /// - `min_workers = 1`, `max_workers = 8`
    /// - `load_threshold = 768` (75% of the queue)
    /// - `scale_interval = 5ms`
    /// - `grace = 10s`
    /// - `default_timeout = 10ms`
    /// - `timeout_policy = TimeoutPolicy::Detach`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            min_workers: 1,
            max_workers: 8,
            load_threshold: 768,
            scale_interval: Duration::from_millis(5),
            grace: Duration::from_secs(10),
            default_timeout: Duration::from_millis(10),
            timeout_policy: TimeoutPolicy::Detach,
            bus_capacity: 1024,
        }
    }
}
