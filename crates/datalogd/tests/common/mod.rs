//! Common test utilities for datalogger integration tests.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::DuplexStream;
use tokio_util::sync::CancellationToken;

use datalogd::device::{DeviceSession, DeviceTransport};
use datalogd::{DatalogError, DatalogResult, DeviceConfig, IngestLoop, MemoryStore};

/// One scripted device session.
pub enum SessionScript {
    /// Yields the given bytes, then end-of-stream.
    Lines(String),
    /// Stays open without producing data until the session is released.
    Hang,
    /// Reads from the given pipe half; the test keeps the writer.
    Piped(DuplexStream),
}

/// Creates a piped session plus the writer half the test drives it with.
pub fn piped_session() -> (SessionScript, DuplexStream) {
    let (reader, writer) = tokio::io::duplex(256);
    (SessionScript::Piped(reader), writer)
}

/// Transport replaying a fixed sequence of sessions.
///
/// Once the script is exhausted, further opens fail, which parks the
/// supervisor in its (cancellable) cooldown loop.
pub struct ScriptedTransport {
    sessions: Mutex<VecDeque<SessionScript>>,
    opens: AtomicUsize,
    holders: Mutex<Vec<DuplexStream>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<SessionScript>) -> Self {
        Self {
            sessions: Mutex::new(script.into_iter().collect()),
            opens: AtomicUsize::new(0),
            holders: Mutex::new(Vec::new()),
        }
    }

    /// Number of times the device has been opened.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceTransport for ScriptedTransport {
    async fn open(&self, address: &str, _baud_rate: u32) -> DatalogResult<DeviceSession> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let next = self.sessions.lock().unwrap().pop_front();
        match next {
            Some(SessionScript::Lines(data)) => Ok(Box::new(Cursor::new(data.into_bytes()))),
            Some(SessionScript::Hang) => {
                let (reader, writer) = tokio::io::duplex(64);
                self.holders.lock().unwrap().push(writer);
                Ok(Box::new(reader))
            }
            Some(SessionScript::Piped(reader)) => Ok(Box::new(reader)),
            None => Err(DatalogError::DeviceOpen {
                address: address.to_owned(),
                message: "script exhausted".to_owned(),
            }),
        }
    }
}

/// Complete ingestion pipeline wired against scripted sessions and an
/// in-memory store.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub transport: Arc<ScriptedTransport>,
    pub cancel: CancellationToken,
}

impl TestHarness {
    pub fn new(script: Vec<SessionScript>) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            transport: Arc::new(ScriptedTransport::new(script)),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawns the supervised ingestion task with the given cooldown.
    pub fn spawn_supervised(&self, cooldown: Duration) -> tokio::task::JoinHandle<()> {
        let ingest = IngestLoop::new(
            Arc::clone(&self.transport) as Arc<dyn DeviceTransport>,
            Arc::clone(&self.store) as Arc<dyn datalogd::LogStore>,
            DeviceConfig {
                address: "/dev/ttyTEST".to_owned(),
                baud_rate: 9600,
            },
            Duration::from_millis(1),
        );
        let cancel = self.cancel.clone();

        tokio::spawn(datalogd::supervise(cancel, cooldown, move |token| {
            let ingest = ingest.clone();
            async move { ingest.run(token).await }
        }))
    }

    /// Waits until the store holds at least `n` records.
    pub async fn wait_for_records(&self, n: usize) {
        let store = Arc::clone(&self.store);
        tokio::time::timeout(Duration::from_secs(5), async move {
            while store.len() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("store never reached {n} records"));
    }

    /// Waits until the transport has been opened at least `n` times.
    pub async fn wait_for_opens(&self, n: usize) {
        let transport = Arc::clone(&self.transport);
        tokio::time::timeout(Duration::from_secs(5), async move {
            while transport.opens() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("device never reached {n} opens"));
    }

    /// Cancels ingestion and waits for the supervised task to finish.
    pub async fn stop(&self, handle: tokio::task::JoinHandle<()>) {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("supervisor must acknowledge cancellation")
            .expect("supervised task must not panic");
    }
}
