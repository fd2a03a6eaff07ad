//! # dynapool
//!
//! **dynapool** is a dynamically-sized async worker pool for Rust.
//!
//! Producers submit typed requests into a bounded queue without blocking. A
//! variable number of workers compete for those requests and run the handler
//! registered for each request type, with a per-attempt timeout and a retry
//! budget. A scaling loop grows or shrinks the pool from the queue depth, and
//! shutdown drains the queue under a deadline before forcing workers out.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer        producer        producer
//!      │ submit()      │ submit()      │ try_submit()
//!      ▼               ▼               ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Dispatcher                                                   │
//! │  - bounded queue (full → drop, counted + RequestDropped)      │
//! │  - stop channel (one message retires one worker)              │
//! │  - PoolState (worker count under a mutex)                     │
//! │  - TaskTracker (outstanding workers, awaited by stop)         │
//! │  - scaler: every tick ScalePolicy::decide(load, count)        │
//! └──────┬──────────────────┬──────────────────┬──────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ worker 1 │       │ worker 2 │  ...  │ worker N │   (min ≤ N ≤ max)
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ HandlerRegistry::get(type) → run_attempt() × (max_retries + 1)
//!        ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 Bus (broadcast channel of Event)              │
//! └───────────────────────────────┬───────────────────────────────┘
//!                                 ▼
//!                           SubscriberSet
//!                       ┌─────────┼─────────┐
//!                       ▼         ▼         ▼
//!                   LogWriter   sub 2  ...  sub N
//! ```
//!
//! ### Request lifecycle
//! ```text
//! submit ─► queued ─► worker ─► handler missing ─────────────► Unhandled
//!                        │
//!                        └─► attempt k (timeout t, default 10ms)
//!                              ├─ Ok                         ─► Succeeded { attempts: k }
//!                              ├─ Fatal                      ─► Rejected
//!                              ├─ Fail / timeout / panic, k ≤ max_retries ─► attempt k+1
//!                              └─ Fail / timeout / panic, k = max_retries + 1 ─► Exhausted
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Pool**          | Queue, workers, scaling loop, graceful shutdown.              | [`Dispatcher`], [`PoolBuilder`]            |
//! | **Requests**      | Typed requests, handlers, awaitable outcomes.                 | [`Request`], [`Handler`], [`Receipt`]      |
//! | **Policies**      | Queue-pressure scaling and timed-out task handling.           | [`ScalePolicy`], [`TimeoutPolicy`]         |
//! | **Observability** | Events, subscribers, tracing output, exact counters.          | [`Subscribe`], [`LogWriter`], [`PoolMetrics`] |
//! | **Errors**        | Typed errors for handlers, attempts, submission and runtime.  | [`HandlerError`], [`RuntimeError`]         |
//! | **Configuration** | Centralized pool settings.                                    | [`PoolConfig`]                             |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use dynapool::{Dispatcher, HandlerRegistry, Outcome, PoolConfig, Request, RequestType};
//!
//! const GREET: RequestType = RequestType(1);
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handlers = HandlerRegistry::new().with_fn(GREET, |name: Arc<String>, _ctx: CancellationToken| async move {
//!         println!("hello, {name}");
//!         Ok(())
//!     });
//!
//!     let pool = Dispatcher::builder(PoolConfig::default())
//!         .with_handlers(handlers)
//!         .build()?;
//!     pool.start()?;
//!
//!     let (req, receipt) = Request::new(GREET, "world".to_string())
//!         .with_timeout(Duration::from_millis(100))
//!         .tracked();
//!     pool.submit(req);
//!
//!     assert_eq!(receipt.outcome().await?, Outcome::Succeeded { attempts: 1 });
//!     pool.stop(Duration::from_secs(1)).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod requests;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Dispatcher, PoolBuilder, PoolConfig, PoolMetrics, WorkerId};
pub use error::{AttemptError, HandlerError, ReceiptError, RuntimeError, SubmitError};
pub use events::{Bus, Event, EventKind};
pub use policies::{ScaleDecision, ScalePolicy, TimeoutPolicy, SHRINK_RATIO};
pub use requests::{
    BoxHandlerFuture, Handler, HandlerFn, HandlerRef, HandlerRegistry, Outcome, Receipt, Request,
    RequestId, RequestType,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet, LOG_TARGET};
