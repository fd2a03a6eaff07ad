//! # Queue-pressure scaling policy.
//!
//! [`ScalePolicy`] decides, once per scaler tick, whether the pool should grow,
//! shrink or hold based on the sampled queue depth (`load`):
//!
//! ```text
//! load >  threshold          && workers < max  → Grow   (add one worker)
//! load <  0.75 × threshold   && workers > min  → Shrink (remove one worker)
//! otherwise                                    → Hold
//! ```
//!
//! The band between `0.75 × threshold` and `threshold` is hysteresis: the pool
//! does not oscillate when load hovers around the threshold. The sampled depth
//! is not synchronized with enqueue/dequeue; the policy only needs eventual
//! convergence.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use dynapool::{ScaleDecision, ScalePolicy};
//!
//! let policy = ScalePolicy {
//!     min_workers: 2,
//!     max_workers: 5,
//!     load_threshold: 8,
//!     interval: Duration::from_millis(5),
//! };
//!
//! assert_eq!(policy.decide(9, 2), ScaleDecision::Grow);
//! assert_eq!(policy.decide(7, 3), ScaleDecision::Hold);
//! assert_eq!(policy.decide(5, 3), ScaleDecision::Shrink);
//! assert_eq!(policy.decide(0, 2), ScaleDecision::Hold);
//! ```

use std::time::Duration;

/// Fraction of `load_threshold` below which the pool shrinks.
pub const SHRINK_RATIO: f64 = 0.75;

/// One tick's scaling verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Add one worker.
    Grow,
    /// Remove one worker.
    Shrink,
    /// Leave the pool as is.
    Hold,
}

/// Bounds, threshold and poll interval of the scaling loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePolicy {
    /// Floor for the worker count.
    pub min_workers: usize,
    /// Ceiling for the worker count.
    pub max_workers: usize,
    /// Queue depth above which the pool grows.
    pub load_threshold: usize,
    /// Time between two load samples.
    pub interval: Duration,
}

impl ScalePolicy {
    /// Evaluates the policy for the sampled `load` and current `workers`.
    pub fn decide(&self, load: usize, workers: usize) -> ScaleDecision {
        if load > self.load_threshold && workers < self.max_workers {
            ScaleDecision::Grow
        } else if (load as f64) < SHRINK_RATIO * self.load_threshold as f64
            && workers > self.min_workers
        {
            ScaleDecision::Shrink
        } else {
            ScaleDecision::Hold
        }
    }
}
