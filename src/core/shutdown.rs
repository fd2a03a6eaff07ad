//! # Cross-platform OS signal handling.
//!
//! Provides [`wait_for_shutdown_signal`], used by
//! [`Dispatcher::stop_on_signal`](crate::Dispatcher::stop_on_signal).
//!
//! ## Signals
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//!
//! **Other platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].

/// Completes when the process receives a termination signal.
///
/// Each call registers independent listeners; registration failures are returned.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => tracing::info!(signal = "SIGINT", "shutdown signal received"),
        _ = sigterm.recv() => tracing::info!(signal = "SIGTERM", "shutdown signal received"),
        _ = sigquit.recv() => tracing::info!(signal = "SIGQUIT", "shutdown signal received"),
    }
    Ok(())
}

/// Completes when the process receives Ctrl-C.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl_c", "shutdown signal received");
    Ok(())
}
