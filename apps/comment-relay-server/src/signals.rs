//! Process shutdown wiring: SIGINT and SIGTERM cancel one shared token.

use tokio_util::sync::CancellationToken;

/// Install the termination handlers and return the token they cancel.
///
/// Handlers are registered before this returns, so a signal that arrives
/// while the rest of startup runs is not lost.
///
/// # Errors
/// Returns the OS error when a handler cannot be registered.
#[cfg(unix)]
pub fn shutdown_token() -> std::io::Result<CancellationToken> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        let received = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        tracing::info!(signal = received, "stop requested, draining");
        trigger.cancel();
    });
    Ok(token)
}

/// Ctrl+C is the only termination request outside unix.
///
/// # Errors
/// Never fails here; registration errors surface when the handler first polls.
#[cfg(not(unix))]
pub fn shutdown_token() -> std::io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!(signal = "ctrl-c", "stop requested, draining"),
            Err(e) => tracing::error!(error = %e, "ctrl-c handler failed, stopping"),
        }
        trigger.cancel();
    });
    Ok(token)
}
