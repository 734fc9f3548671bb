//! Service lifecycle management.
//!
//! Wires the supervised ingestion task and the query API together, handles
//! the interrupt signal, and drives the two-phase shutdown (cancel, then
//! wait for ingestion to acknowledge).

use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api;
use crate::config::DatalogConfig;
use crate::device::{DeviceTransport, SerialTransport};
use crate::error::{DatalogError, DatalogResult};
use crate::ingest::IngestLoop;
use crate::store::{LogStore, SqliteStore};
use crate::supervisor::supervise;

/// The datalogger service.
///
/// Runs two concurrent tasks: the retry supervisor wrapping the ingestion
/// loop, and the HTTP query server. A shared cancellation token stops both.
pub struct DatalogService {
    config: DatalogConfig,
    cancel: CancellationToken,
}

impl DatalogService {
    /// Create a new service with the given configuration.
    #[must_use]
    pub fn new(config: DatalogConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Run the service until an interrupt signal (or [`Self::shutdown`]).
    ///
    /// Failing to open the storage file or bind the listen address is
    /// fatal; everything on the ingestion side is absorbed by the
    /// supervisor and never escapes the process.
    pub async fn run(&self) -> DatalogResult<()> {
        let store: Arc<dyn LogStore> =
            Arc::new(SqliteStore::open(&self.config.storage.path).await?);
        info!(path = %self.config.storage.path.display(), "storage opened");

        let ingest_handle = self.spawn_ingest(Arc::clone(&store));

        let app = api::router(api::ApiState { store });
        let listener = tokio::net::TcpListener::bind(&self.config.server.listen_addr)
            .await
            .map_err(|e| {
                DatalogError::Config(format!(
                    "failed to bind {}: {e}",
                    self.config.server.listen_addr
                ))
            })?;
        info!(addr = %self.config.server.listen_addr, "query API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(self.cancel.clone()))
            .await
            .map_err(|e| DatalogError::Config(format!("server error: {e}")))?;

        // Two-phase shutdown: cancel, then wait for the supervisor to
        // acknowledge. The query server has already drained; the read path
        // holds no unflushed state.
        info!("waiting for ingestion to stop");
        self.cancel.cancel();
        if let Err(e) = ingest_handle.await {
            error!(error = %e, "ingestion task failed");
        }

        info!("shutdown complete");
        Ok(())
    }

    fn spawn_ingest(&self, store: Arc<dyn LogStore>) -> tokio::task::JoinHandle<()> {
        let transport: Arc<dyn DeviceTransport> = Arc::new(SerialTransport::new());
        let ingest = IngestLoop::new(
            transport,
            store,
            self.config.device.clone(),
            self.config.ingest.settle_delay(),
        );
        let cancel = self.cancel.clone();
        let cooldown = self.config.ingest.retry_cooldown();

        tokio::spawn(supervise(cancel, cooldown, move |token| {
            let ingest = ingest.clone();
            async move { ingest.run(token).await }
        }))
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("received SIGTERM, initiating shutdown");
        }
        () = cancel.cancelled() => {
            info!("shutdown requested");
        }
    }
}
