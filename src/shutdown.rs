//! Graceful Shutdown Handling
//!
//! Listens for SIGTERM/SIGINT (Ctrl+C elsewhere) and broadcasts a single
//! shutdown signal to the HTTP server and background tasks.

use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// Shutdown coordinator shared by the server and its background tasks
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: Arc<watch::Sender<bool>>,
    /// How long in-flight requests get to finish
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get a shutdown receiver; it observes a signal sent before subscribing too
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn is_triggered(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Broadcast the shutdown signal
    pub fn trigger(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Future that resolves once shutdown has been triggered
    pub fn signalled(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        wait_for_shutdown(self.subscribe())
    }

    /// Wait for SIGTERM/SIGINT, then broadcast the shutdown signal
    pub async fn listen_for_signals(&self) -> Result<()> {
        info!("Starting shutdown signal listener");

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                }
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                }
            }
        }

        #[cfg(windows)]
        {
            signal::ctrl_c().await?;
            info!("Received Ctrl+C, initiating graceful shutdown");
        }

        self.trigger();
        Ok(())
    }
}

/// Resolve once `rx` observes the shutdown signal
pub async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    // A closed channel means the coordinator is gone; treat it as shutdown.
    let _ = rx.wait_for(|triggered| *triggered).await;
}
