//! Termination signal handling.

use tracing::{error, info};

/// Which signal ended the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Resolve on the first SIGINT (Ctrl+C) or SIGTERM.
pub async fn wait_for_signal() -> ShutdownSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("SIGINT received, stopping monitor");
                        ShutdownSignal::Interrupt
                    }
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, stopping monitor");
                        ShutdownSignal::Terminate
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "failed to register SIGTERM handler");
                ctrl_c().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

async fn ctrl_c() -> ShutdownSignal {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        // Without a handler the monitor can only be killed outright
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received, stopping monitor");
    ShutdownSignal::Interrupt
}
