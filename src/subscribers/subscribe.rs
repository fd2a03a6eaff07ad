//! # Core subscriber trait
//!
//! `Subscribe` is the observer extension point of the pool: every significant
//! event (worker start/stop, scaling, drops, retries, timeouts, exhaustion,
//! shutdown) reaches subscribers through it. Each subscriber is driven by a
//! dedicated worker loop fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) – they do **not** block
//!   the dispatcher, its workers, nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** and a `SubscriberOverflow` event is published.
//! - Observers are not part of the pool's correctness contract; use
//!   [`Dispatcher::metrics`](crate::Dispatcher::metrics) for exact counts.
//!
//! ## Example
//! ```rust
//! use dynapool::{Event, EventKind, Subscribe};
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! #[derive(Default)]
//! struct DropCounter(AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for DropCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::RequestDropped {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "drop-counter" }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped**.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
