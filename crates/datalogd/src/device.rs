//! Serial device transport.
//!
//! The transport is the seam between the ingestion loop and the physical
//! hardware: it turns an address/baud-rate pair into a readable byte
//! session. Production uses a real serial port; tests substitute scripted
//! sessions.

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio_serial::SerialPortBuilderExt;

use crate::error::{DatalogError, DatalogResult};

/// An open device session: a readable byte stream.
///
/// Dropping the session closes the underlying handle, which is what
/// unblocks any read still pending on it.
pub type DeviceSession = Box<dyn AsyncRead + Send + Unpin>;

/// Opens byte stream sessions against a device address.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Open the device, returning a readable session.
    async fn open(&self, address: &str, baud_rate: u32) -> DatalogResult<DeviceSession>;
}

/// Serial port transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialTransport;

impl SerialTransport {
    /// Create a new serial transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceTransport for SerialTransport {
    async fn open(&self, address: &str, baud_rate: u32) -> DatalogResult<DeviceSession> {
        let stream = tokio_serial::new(address, baud_rate)
            .open_native_async()
            .map_err(|e| DatalogError::DeviceOpen {
                address: address.to_owned(),
                message: e.to_string(),
            })?;

        Ok(Box::new(stream))
    }
}
