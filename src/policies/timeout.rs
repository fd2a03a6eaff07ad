//! # What happens to a handler task whose attempt timed out.
//!
//! Every attempt runs the handler as its own task. When the attempt deadline
//! fires first, the attempt's cancellation token is cancelled (cooperative
//! handlers stop on their own) and then:
//!
//! - [`TimeoutPolicy::Detach`] (default): the task is left running; its eventual
//!   result is discarded. A handler that ignores its token keeps consuming
//!   resources until it finishes.
//! - [`TimeoutPolicy::Abort`]: the task is aborted at its next `.await` point.
//!   Handlers doing blocking work between awaits still run to that point.

/// Fate of a timed-out attempt's handler task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Cancel the token and let the task finish in the background.
    #[default]
    Detach,
    /// Cancel the token and abort the task.
    Abort,
}
