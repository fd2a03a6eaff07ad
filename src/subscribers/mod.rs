//! # Event subscribers for the pool runtime.
//!
//! This module provides the [`Subscribe`] trait (the injectable observer sink),
//! the [`SubscriberSet`] fan-out and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Dispatcher / Worker / Scaler ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                                  ┌─────────┼─────────┐
//!                                                                  ▼         ▼         ▼
//!                                                              LogWriter   Metrics   Custom
//! ```

mod embedded;
mod set;
mod subscribe;

pub use embedded::{LogWriter, LOG_TARGET};
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

pub(crate) use set::panic_message;
