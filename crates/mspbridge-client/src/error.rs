use mspbridge_device::{AbandonReason, DeviceError};

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Device-level error.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// The reply was shorter than the layout for its code.
    #[error("reply to code {code} too short: expected {expected} bytes, got {actual}")]
    ShortPayload {
        code: u8,
        expected: usize,
        actual: usize,
    },

    /// The device gave up on the request.
    #[error("request abandoned: {0}")]
    Abandoned(AbandonReason),
}

pub type Result<T> = std::result::Result<T, ClientError>;
