//! In-memory record store for testing.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::{DatalogError, DatalogResult};

use super::{LogRecord, LogStore};

/// In-memory record store for testing.
///
/// Assigns ids and timestamps the way the SQLite store does, but keeps
/// everything in a vector. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<LogRecord>,
    next_id: i64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.records.len()).unwrap_or(0)
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Renders a datetime the way the comparison bounds are rendered for SQL,
/// so text comparison against stored timestamps matches the SQLite
/// semantics.
fn bound_text(dt: DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn append(&self, msg: &str) -> DatalogResult<i64> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| DatalogError::Storage("lock poisoned".to_owned()))?;

        let now = Local::now();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(LogRecord {
            id,
            timestamp: now.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            // Derived from the stored text the way the SQLite store does
            // it: the naive local string read back as if it were UTC.
            epoch: now.naive_local().and_utc().timestamp_micros() as f64 / 1_000_000.0,
            msg: msg.to_owned(),
        });

        Ok(id)
    }

    async fn latest(&self, limit: u32) -> DatalogResult<Vec<LogRecord>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| DatalogError::Storage("lock poisoned".to_owned()))?;

        let mut records: Vec<LogRecord> = inner.records.clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn range(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
        limit: u32,
    ) -> DatalogResult<Vec<LogRecord>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| DatalogError::Storage("lock poisoned".to_owned()))?;

        let start = bound_text(start);
        let end = bound_text(end);

        let mut records: Vec<LogRecord> = inner
            .records
            .iter()
            .filter(|r| r.timestamp.as_str() >= start.as_str() && r.timestamp.as_str() <= end.as_str())
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        records.truncate(limit as usize);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn append_assigns_ascending_ids() {
        let store = MemoryStore::new();

        let first = store.append("a").await.unwrap();
        let second = store.append("b").await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn latest_returns_newest_first() {
        let store = MemoryStore::new();

        for i in 0..5 {
            store.append(&format!("r{i}")).await.unwrap();
        }

        let records = store.latest(3).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].msg, "r4");
        for pair in records.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn range_filters_inclusively() {
        let store = MemoryStore::new();

        store.append("inside").await.unwrap();

        let now = Local::now();
        let hit = store
            .range(now - ChronoDuration::hours(1), now + ChronoDuration::hours(1), 10)
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);

        let past = now - ChronoDuration::days(30);
        let miss = store
            .range(past, past + ChronoDuration::minutes(1), 10)
            .await
            .unwrap();
        assert!(miss.is_empty());
    }
}
