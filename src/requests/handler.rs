//! # Handler abstraction and function-backed handler implementation.
//!
//! A [`Handler`] is the business logic invoked for one request type. It receives
//! the request payload (shared through `Arc`, so each attempt can read it) and a
//! [`CancellationToken`] that is cancelled when the attempt times out or the pool
//! is force-stopped. Handlers that ignore the token keep running in the background
//! after a timeout; their result is discarded.
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Arc<P>, CancellationToken) -> Fut`,
//! producing a fresh future per attempt.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use dynapool::{Handler, HandlerError, HandlerFn};
//!
//! let echo = HandlerFn::new(|msg: Arc<String>, _ctx: CancellationToken| async move {
//!     if msg.is_empty() {
//!         return Err(HandlerError::fail("empty message"));
//!     }
//!     Ok(())
//! });
//! # fn assert_handler<H: Handler<String>>(_: &H) {}
//! # assert_handler(&echo);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;

/// Boxed future returned by [`Handler::call`].
pub type BoxHandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'static>>;

/// Shared handle to a handler, as stored in the registry.
pub type HandlerRef<P> = Arc<dyn Handler<P>>;

/// # Business logic for one request type.
///
/// The returned future is spawned as its own task, so it must be `'static`.
pub trait Handler<P>: Send + Sync + 'static {
    /// Starts one attempt for `payload`.
    fn call(&self, payload: Arc<P>, ctx: CancellationToken) -> BoxHandlerFuture;
}

/// Function-backed handler.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Wraps a closure producing one future per attempt.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<P, F, Fut> Handler<P> for HandlerFn<F>
where
    P: Send + Sync + 'static,
    F: Fn(Arc<P>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn call(&self, payload: Arc<P>, ctx: CancellationToken) -> BoxHandlerFuture {
        Box::pin((self.f)(payload, ctx))
    }
}
