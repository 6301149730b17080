use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};

use crate::AppState;

/// Wait for shutdown signal (SIGTERM or ctrl-c) and mark the service as
/// shutting down so `/health` starts failing while in-flight requests drain.
pub async fn wait_for_shutdown(state: Arc<AppState>) {
    shutdown_signal().await;
    info!("shutdown signal received");
    state.shutting_down.store(true, Ordering::Relaxed);
}

/// Listen for SIGTERM (Kubernetes pod termination) or ctrl-c.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to listen for SIGTERM, falling back to ctrl-c");
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for ctrl-c");
            }
            return;
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();

    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received"),
        _ = ctrl_c => info!("ctrl-c received"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
    }
}
