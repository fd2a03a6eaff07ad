//! Scaling and timeout policies.
//!
//! This module groups the knobs that control **how many** workers run and
//! **what happens** to an attempt that outlives its timeout.
//!
//! ## Contents
//! - [`ScalePolicy`] when to add/remove a worker (queue-depth threshold with hysteresis)
//! - [`ScaleDecision`] one tick's verdict
//! - [`TimeoutPolicy`] detach or abort a timed-out handler task
//!
//! ## Quick wiring
//! ```text
//! PoolConfig { min/max_workers, load_threshold, scale_interval, timeout_policy }
//!      ├─► PoolConfig::scale_policy() ─► Dispatcher::scale_workers() (per tick: decide)
//!      └─► timeout_policy            ─► core::runner::run_attempt()
//! ```
//!
//! ## Defaults
//! - `ScalePolicy` comes from `PoolConfig::default()`: 1..=8 workers, threshold 768, 5ms tick.
//! - `TimeoutPolicy::Detach`.

mod scale;
mod timeout;

pub use scale::{ScaleDecision, ScalePolicy, SHRINK_RATIO};
pub use timeout::TimeoutPolicy;
