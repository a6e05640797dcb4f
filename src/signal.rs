// ABOUTME: Termination signal handling.
// ABOUTME: Resolves when SIGINT or SIGTERM arrives, carrying the conventional exit code.

/// The signal that ended the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Interrupt,
    Terminate,
}

impl Shutdown {
    /// 128 + signal number.
    pub fn exit_code(&self) -> i32 {
        match self {
            Shutdown::Interrupt => 130,
            Shutdown::Terminate => 143,
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM. A handler that cannot be installed never fires.
pub async fn wait_for_shutdown() -> Shutdown {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C)");
            Shutdown::Interrupt
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM");
            Shutdown::Terminate
        }
    }
}
