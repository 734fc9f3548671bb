//! Device ingestion loop.
//!
//! Owns one device session: opens it, drains the line stream, writes each
//! line to storage, and detects stream termination. Recovery across
//! sessions is the supervisor's job; one call to [`IngestLoop::run`] is one
//! connection attempt.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::DeviceConfig;
use crate::device::DeviceTransport;
use crate::error::{DatalogError, DatalogResult};
use crate::store::LogStore;
use crate::stream::LineStream;

/// One supervised connection attempt against the device.
#[derive(Clone)]
pub struct IngestLoop {
    transport: Arc<dyn DeviceTransport>,
    store: Arc<dyn LogStore>,
    device: DeviceConfig,
    settle_delay: Duration,
}

impl IngestLoop {
    /// Create a new ingestion loop.
    #[must_use]
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        store: Arc<dyn LogStore>,
        device: DeviceConfig,
        settle_delay: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            device,
            settle_delay,
        }
    }

    /// Run one device session until it ends, fails, or is cancelled.
    ///
    /// The session is released on every exit path: it is owned by the line
    /// stream, whose drop aborts the reader and closes the handle. Lines
    /// are persisted strictly in arrival order; a storage failure aborts
    /// the attempt so the supervisor starts a fresh session.
    pub async fn run(&self, cancel: CancellationToken) -> DatalogResult<()> {
        let session = self
            .transport
            .open(&self.device.address, self.device.baud_rate)
            .await?;
        info!(
            address = %self.device.address,
            baud_rate = self.device.baud_rate,
            "device opened"
        );

        // The transport needs a brief quiescence window before reads are
        // reliable.
        tokio::time::sleep(self.settle_delay).await;

        let mut lines = LineStream::spawn(session);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    info!(address = %self.device.address, "ingestion cancelled, releasing device");
                    return Err(DatalogError::Cancelled);
                }

                line = lines.next_line() => {
                    match line {
                        Some(msg) => {
                            let id = self.store.append(&msg).await?;
                            // The only confirmation channel for ingestion.
                            info!(
                                id,
                                timestamp = %Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                                msg = %msg,
                                "record persisted"
                            );
                        }
                        None => return Err(DatalogError::StreamClosed),
                    }
                }
            }
        }
    }
}
