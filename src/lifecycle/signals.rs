//! OS signal handling.
//!
//! SIGINT (Ctrl+C) and, on Unix, SIGTERM end the run by flipping the server's
//! `should_exit` flag. Signals bypass the auto-reload restriction on
//! `App::shutdown`: the supervisor itself is being asked to stop.

use std::sync::Arc;

use crate::lifecycle::context::RuntimeContext;

/// Wait for a termination signal.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

/// Spawn a task that requests exit on the first termination signal.
pub fn install(ctx: Arc<RuntimeContext>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        shutdown_signal().await;
        ctx.server().request_exit();
    })
}
