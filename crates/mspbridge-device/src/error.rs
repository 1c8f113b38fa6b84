/// Errors that can occur when talking to a device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device task is not running.
    #[error("device not connected")]
    NotConnected,

    /// The device task stopped before resolving the request.
    #[error("device disconnected")]
    Disconnected,

    /// The request could not be framed.
    #[error("frame error: {0}")]
    Frame(#[from] mspbridge_frame::FrameError),

    /// I/O error on the serial stream.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
