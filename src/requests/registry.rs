//! # Handler registry.
//!
//! Immutable mapping from [`RequestType`] to the [`Handler`] that processes it.
//! Built once, then shared by every worker through `Arc` (never copied, never mutated).
//!
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use dynapool::{HandlerRegistry, RequestType};
//!
//! let registry = HandlerRegistry::<u64>::new()
//!     .with_fn(RequestType(1), |_n: Arc<u64>, _ctx: CancellationToken| async { Ok(()) });
//!
//! assert!(registry.contains(RequestType(1)));
//! assert!(!registry.contains(RequestType(2)));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::handler::{Handler, HandlerFn, HandlerRef};
use super::request::RequestType;
use crate::error::HandlerError;

/// Read-only lookup table of handlers by request type.
pub struct HandlerRegistry<P> {
    handlers: HashMap<RequestType, HandlerRef<P>>,
}

impl<P: Send + Sync + 'static> HandlerRegistry<P> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `kind`, replacing any previous one.
    pub fn with(mut self, kind: RequestType, handler: impl Handler<P>) -> Self {
        self.handlers.insert(kind, Arc::new(handler));
        self
    }

    /// Registers a closure for `kind` (see [`HandlerFn`]).
    pub fn with_fn<F, Fut>(self, kind: RequestType, f: F) -> Self
    where
        F: Fn(Arc<P>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.with(kind, HandlerFn::new(f))
    }

    /// Looks up the handler for `kind`.
    pub fn get(&self, kind: RequestType) -> Option<&HandlerRef<P>> {
        self.handlers.get(&kind)
    }

    /// True if a handler is registered for `kind`.
    pub fn contains(&self, kind: RequestType) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Returns the registered request types in ascending order.
    pub fn kinds(&self) -> Vec<RequestType> {
        let mut kinds: Vec<RequestType> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<P: Send + Sync + 'static> Default for HandlerRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for HandlerRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&RequestType> = self.handlers.keys().collect();
        kinds.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
