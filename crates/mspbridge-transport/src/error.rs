/// Errors that can occur while opening or using a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the tunnel endpoint.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to open the serial device.
    #[cfg(feature = "serial")]
    #[error("failed to open serial port {path}: {source}")]
    SerialOpen {
        path: std::path::PathBuf,
        source: tokio_serial::Error,
    },

    /// An I/O error occurred on an open stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
