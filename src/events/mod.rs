//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the dispatcher, its workers
//! and the scaling loop.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Dispatcher` (drops, scaling, shutdown), `Worker` (lifecycle,
//!   attempts, outcomes), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `PoolBuilder::build`, which fans out
//!   to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
