//! # Request data model and handler registry.
//!
//! - [`Request`] - unit of work (type tag, payload, timeout, retry budget)
//! - [`Outcome`], [`Receipt`] - terminal result and how a caller awaits it
//! - [`Handler`], [`HandlerFn`] - business logic per request type
//! - [`HandlerRegistry`] - immutable type → handler mapping shared by all workers

mod handler;
mod registry;
mod request;

pub use handler::{BoxHandlerFuture, Handler, HandlerFn, HandlerRef};
pub use registry::HandlerRegistry;
pub use request::{Outcome, Receipt, Request, RequestId, RequestType};

pub(crate) use request::RequestMeta;
