//! Serial device datalogger with an HTTP query API.
//!
//! The datalogger is responsible for:
//!
//! - **Ingestion**: reading newline-delimited telemetry from a serial
//!   device and persisting each line as a timestamped record
//! - **Resilience**: keeping the device connection alive across failures
//!   via a supervised fixed-cooldown retry loop
//! - **Queries**: exposing the accumulated log over a read-only HTTP
//!   interface, by time range or as a latest-N view
//!
//! # Architecture
//!
//! Two concurrent tasks share one SQLite store: the ingestion supervisor
//! and the query server. The line stream adapter adds one producer task
//! per open device session, feeding the ingestion loop through a bounded
//! channel. A single cancellation token, propagated from the service down
//! into the ingestion loop, drives the two-phase shutdown: cancel, then
//! wait for ingestion to acknowledge.
//!
//! ```text
//! bytes ──▶ LineStream ──▶ IngestLoop ──▶ LogStore ◀── query API ──▶ JSON
//!              ▲               ▲
//!        producer task   supervise() retry
//! ```

pub mod api;
pub mod config;
pub mod device;
pub mod error;
pub mod ingest;
pub mod service;
pub mod store;
pub mod stream;
pub mod supervisor;

// Re-export main types
pub use config::{DatalogConfig, DeviceConfig, IngestConfig, ServerConfig, StorageConfig};
pub use error::{DatalogError, DatalogResult};
pub use ingest::IngestLoop;
pub use service::DatalogService;
pub use store::{LogRecord, LogStore, MemoryStore, SqliteStore};
pub use stream::LineStream;
pub use supervisor::supervise;
