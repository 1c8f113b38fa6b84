use std::fmt;

use bytes::Bytes;

/// Why a request finished without a usable reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// No frame arrived within the request's wait.
    Timeout,
    /// A frame arrived, but for a different code.
    Mismatch { code: u8 },
    /// The request could not be written to the device.
    WriteFailed,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("no reply before timeout"),
            Self::Mismatch { code } => write!(f, "reply carried unexpected code {code}"),
            Self::WriteFailed => f.write_str("request could not be written"),
        }
    }
}

/// Outcome of one request.
///
/// The queue never retries and never raises on a lost reply; it reports the
/// loss as [`Reply::Abandoned`] and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Payload(Bytes),
    Abandoned(AbandonReason),
}

impl Reply {
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned(_))
    }

    /// The reply payload, or the reason there is none.
    pub fn into_result(self) -> std::result::Result<Bytes, AbandonReason> {
        match self {
            Self::Payload(payload) => Ok(payload),
            Self::Abandoned(reason) => Err(reason),
        }
    }
}
