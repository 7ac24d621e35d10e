//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for Ctrl+C (SIGINT)
//! - Listen for an internal shutdown trigger
//! - Resolve when either arrives, so the server can drain
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - If the signal handler cannot be installed, only the internal trigger
//!   stops the server

use tokio::sync::broadcast;

/// Wait for Ctrl+C or a `Shutdown::trigger`.
pub async fn wait_for_shutdown(mut trigger: broadcast::Receiver<()>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                let _ = trigger.recv().await;
                tracing::info!("Shutdown triggered");
            }
        },
        _ = trigger.recv() => tracing::info!("Shutdown triggered"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::shutdown::Shutdown;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_resolves_wait() {
        let shutdown = Shutdown::new();
        let waiter = tokio::spawn(wait_for_shutdown(shutdown.subscribe()));
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_for_shutdown did not resolve")
            .unwrap();
    }
}
