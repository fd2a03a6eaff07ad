//! # Run a single attempt of a request.
//!
//! Executes one handler call with a deadline. The handler future is spawned as
//! its own task and its `JoinHandle` is raced against the timeout, so a handler
//! that never yields or never observes cancellation cannot hold the worker past
//! the deadline.
//!
//! ## Flow
//! ```text
//! child = force.child_token()
//! spawn(async { handler.call(payload, child).await }) ─► JoinHandle
//!        │
//! timeout(dur, &mut handle)
//!   ├─ Ok(Ok(Ok(())))     → Ok(())
//!   ├─ Ok(Ok(Err(e)))     → Err(Handler(e))
//!   ├─ Ok(Err(join_err))  → Err(Panicked)
//!   └─ Err(elapsed)       → child.cancel()
//!                           Abort  → handle.abort()
//!                           Detach → drop(handle)
//!                           → Err(Timeout)
//! ```
//!
//! ## Rules
//! - Derives a **child token** per attempt: timing out cancels only this attempt
//! - A forced stop of the pool cancels every attempt's token through the parent
//! - Events are published by the caller; this function only classifies the result

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::AttemptError;
use crate::policies::TimeoutPolicy;
use crate::requests::HandlerRef;
use crate::subscribers::panic_message;

/// Executes a single attempt of `handler` on `payload` with the given deadline.
pub(crate) async fn run_attempt<P>(
    handler: &HandlerRef<P>,
    payload: &Arc<P>,
    timeout: Duration,
    policy: TimeoutPolicy,
    parent: &CancellationToken,
) -> Result<(), AttemptError>
where
    P: Send + Sync + 'static,
{
    let child = parent.child_token();
    let mut handle = {
        let handler = Arc::clone(handler);
        let payload = Arc::clone(payload);
        let token = child.clone();
        // `call` itself runs in the task: a panic before the future exists is a JoinError too.
        tokio::spawn(async move { handler.call(payload, token).await })
    };

    match time::timeout(timeout, &mut handle).await {
        Ok(Ok(res)) => res.map_err(AttemptError::from),
        Ok(Err(join_err)) => {
            let reason = if join_err.is_panic() {
                panic_message(&*join_err.into_panic())
            } else {
                "handler task cancelled".to_string()
            };
            Err(AttemptError::Panicked { reason })
        }
        Err(_elapsed) => {
            child.cancel();
            if policy == TimeoutPolicy::Abort {
                handle.abort();
            }
            Err(AttemptError::Timeout { timeout })
        }
    }
}
