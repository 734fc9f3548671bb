//! Record storage backends.
//!
//! This module provides the trait and implementations for persisting log
//! records. The primary implementation uses SQLite; an in-memory
//! implementation is provided for testing.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::DatalogResult;

/// Maximum records returned when no range is supplied.
pub const LATEST_LIMIT: u32 = 10_000;

/// Maximum records returned for a range query.
pub const RANGE_LIMIT: u32 = 1_000_000;

/// One persisted line from the device.
///
/// `id` and `timestamp` are assigned by the store on append; records are
/// immutable once written. Field names are the wire names used by the
/// query API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Storage-assigned monotonic identifier.
    pub id: i64,
    /// Storage-assigned local datetime text with sub-second precision.
    pub timestamp: String,
    /// Unix epoch derived from `timestamp`, including sub-second fraction.
    pub epoch: f64,
    /// The line as read from the device.
    pub msg: String,
}

/// Backend for the append-only record log.
///
/// The store assigns `id` and `timestamp` on append. Writes are serialised
/// by the backend's own concurrency control; callers impose no additional
/// locking.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append one message, returning the assigned record id.
    async fn append(&self, msg: &str) -> DatalogResult<i64>;

    /// The most recent records, ordered by timestamp descending.
    async fn latest(&self, limit: u32) -> DatalogResult<Vec<LogRecord>>;

    /// Records with timestamps in `[start, end]` inclusive, ordered by
    /// timestamp descending.
    async fn range(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
        limit: u32,
    ) -> DatalogResult<Vec<LogRecord>>;
}
