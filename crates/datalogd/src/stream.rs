//! Line stream adapter.
//!
//! Wraps a raw byte session and emits discrete text lines. A producer task
//! reads from the session and feeds a bounded channel, decoupling read
//! timing from processing timing; the bound is an explicit backpressure
//! point, so a slow consumer stalls the reader instead of growing memory.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

/// Capacity of the line channel. The producer suspends once this many
/// lines are buffered unconsumed.
pub const LINE_BUFFER: usize = 1024;

/// A lazy sequence of newline-delimited records read from a byte session.
///
/// The sequence closes when the session reaches end-of-stream or reports a
/// read error; the error is logged here, and the consumer observes only
/// that the stream ended. Dropping the stream aborts the producer task,
/// releasing the session and unblocking any pending read.
pub struct LineStream {
    rx: mpsc::Receiver<String>,
    producer: JoinHandle<()>,
}

impl LineStream {
    /// Spawn a producer task over `session` and return the consumer half.
    pub fn spawn(session: impl AsyncRead + Send + Unpin + 'static) -> Self {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);

        let producer = tokio::spawn(async move {
            let mut lines = BufReader::new(session).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            // Consumer is gone; stop reading.
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "failed to read from the device stream");
                        break;
                    }
                }
            }
        });

        Self { rx, producer }
    }

    /// The next line, or `None` once the stream has closed.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for LineStream {
    fn drop(&mut self) {
        self.producer.abort();
    }
}
