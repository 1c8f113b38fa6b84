/// Errors that end a bridge run.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] mspbridge_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] mspbridge_frame::FrameError),

    /// I/O error on the serial side.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial device reached end of stream.
    #[error("serial port closed")]
    SerialClosed,

    /// The TCP link task stopped.
    #[error("tunnel link task stopped")]
    LinkClosed,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
