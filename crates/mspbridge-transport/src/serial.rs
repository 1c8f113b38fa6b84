use std::path::{Path, PathBuf};

use tokio_serial::SerialPortBuilderExt;
pub use tokio_serial::SerialStream;
use tracing::info;

use crate::error::{Result, TransportError};

/// Default device node on a Raspberry Pi style companion board.
pub const DEFAULT_SERIAL_PATH: &str = "/dev/ttyAMA0";

/// MultiWii firmware default.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial port settings. Framing is always 8N1 without flow control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub path: PathBuf,
    pub baud_rate: u32,
}

impl SerialConfig {
    pub fn new(path: impl AsRef<Path>, baud_rate: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            baud_rate,
        }
    }

    /// Open the port for async I/O. Must be called inside a tokio runtime.
    pub fn open(&self) -> Result<SerialStream> {
        let path = self.path.to_string_lossy();
        let stream = tokio_serial::new(path.as_ref(), self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|source| TransportError::SerialOpen {
                path: self.path.clone(),
                source,
            })?;
        info!(path = %path, baud = self.baud_rate, "opened serial port");
        Ok(stream)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERIAL_PATH, DEFAULT_BAUD_RATE)
    }
}
