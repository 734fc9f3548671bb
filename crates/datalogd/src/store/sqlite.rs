//! SQLite-backed record store.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::{DatalogError, DatalogResult};

use super::{LogRecord, LogStore};

/// Textual format the range bounds are rendered in before comparison.
///
/// Stored timestamps carry a sub-second fraction; `datetime(?)` in the
/// queries normalises the bounds to this shape so the comparison stays a
/// plain text comparison.
const SQL_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite-backed record store.
///
/// The schema assigns `id` and a localtime timestamp with millisecond
/// precision on insert, so the ingestion path only ever supplies the
/// message text.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> DatalogResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    DatalogError::Storage(format!("failed to create database directory: {e}"))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DatalogError::Storage(format!("failed to connect: {e}")))?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> DatalogResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS datalog (
                id INTEGER NOT NULL PRIMARY KEY,
                timestamp datetime NOT NULL
                    DEFAULT (STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW', 'localtime')),
                msg TEXT NOT NULL
            )
            ",
        )
        .execute(pool)
        .await
        .map_err(|e| DatalogError::Storage(format!("failed to create table: {e}")))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS datalog_timestamp ON datalog (timestamp)
            ",
        )
        .execute(pool)
        .await
        .map_err(|e| DatalogError::Storage(format!("failed to create index: {e}")))?;

        Ok(())
    }

    fn rows_to_records(rows: Vec<sqlx::sqlite::SqliteRow>) -> Vec<LogRecord> {
        rows.into_iter()
            .map(|row| LogRecord {
                id: row.get("id"),
                timestamp: row.get("timestamp"),
                epoch: row.get("epoch"),
                msg: row.get("msg"),
            })
            .collect()
    }
}

#[async_trait]
impl LogStore for SqliteStore {
    async fn append(&self, msg: &str) -> DatalogResult<i64> {
        let result = sqlx::query("INSERT INTO datalog (msg) VALUES (?)")
            .bind(msg)
            .execute(&self.pool)
            .await
            .map_err(|e| DatalogError::Storage(format!("insert failed: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    async fn latest(&self, limit: u32) -> DatalogResult<Vec<LogRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, timestamp, unixepoch(timestamp, 'subsec') AS epoch, msg
            FROM datalog
            ORDER BY timestamp DESC
            LIMIT ?
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatalogError::Storage(format!("query failed: {e}")))?;

        Ok(Self::rows_to_records(rows))
    }

    async fn range(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
        limit: u32,
    ) -> DatalogResult<Vec<LogRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, timestamp, unixepoch(timestamp, 'subsec') AS epoch, msg
            FROM datalog
            WHERE timestamp BETWEEN datetime(?) AND datetime(?)
            ORDER BY timestamp DESC
            LIMIT ?
            ",
        )
        .bind(start.format(SQL_DATETIME).to_string())
        .bind(end.format(SQL_DATETIME).to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatalogError::Storage(format!("query failed: {e}")))?;

        Ok(Self::rows_to_records(rows))
    }
}
