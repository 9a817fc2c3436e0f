use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Token cancelled on the first SIGINT or SIGTERM.
///
/// The HTTP server drains on this token; once it returns, `main` stops the
/// engine so the scheduler loop is gone before the process exits. Only the
/// first signal is observed; a second one kills the process the usual way.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        tracing::info!(signal = name, "Shutdown signal received, draining");

        trigger.cancel();
    });

    token
}
