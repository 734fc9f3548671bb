//! Error types for the datalogger.

use thiserror::Error;

/// Datalogger errors.
#[derive(Error, Debug)]
pub enum DatalogError {
    /// The serial transport could not be opened.
    ///
    /// Recoverable: the retry supervisor reopens the device after a cooldown.
    #[error("failed to open device {address}: {message}")]
    DeviceOpen {
        /// Device address that failed to open.
        address: String,
        /// Underlying transport error.
        message: String,
    },

    /// The device session ended (disconnect, transient UART fault).
    ///
    /// Recoverable: the most common reconnect driver.
    #[error("device stream closed")]
    StreamClosed,

    /// Persistence failed.
    ///
    /// Recoverable at the ingest level (treated the same as a stream
    /// closure), surfaced as a server error at the query level.
    #[error("storage error: {0}")]
    Storage(String),

    /// The operation was cancelled.
    ///
    /// Not a failure: a terminal signal distinguished from the variants
    /// above so the supervisor applies no cooldown during shutdown.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for datalogger operations.
pub type DatalogResult<T> = std::result::Result<T, DatalogError>;
