//! Payload layouts for every supported MSP code.
//!
//! All multi-byte fields are little-endian and packed with no padding.
//! Decoders accept trailing bytes beyond the layout, since newer firmware
//! appends fields to several replies.

use bytes::BytesMut;

use crate::error::{ClientError, Result};

pub mod codes;
mod commands;
mod queries;

pub use commands::{
    AccCalibration, MagCalibration, ResetConf, SelectSetting, SetBox, SetHead, SetMisc, SetPid,
    SetRawGps, SetRawRc, SetRcTuning, SetServoConf, SetWaypoint,
};
pub use queries::{
    Altitude, Analog, Attitude, Axes, BoxIds, BoxItems, BoxNames, CompGps, Ident, Misc, MotorPins,
    Motors, Pid, PidNames, PidTerm, RawGps, RawImu, RcChannels, RcTuning, ServoConf, ServoConfig,
    Servos, Status, Waypoint, SERVO_COUNT,
};

/// A request whose reply carries data.
pub trait Query: Sized {
    const CODE: u8;
    /// Short name, as accepted on the command line.
    const NAME: &'static str;

    fn decode(payload: &[u8]) -> Result<Self>;
}

/// A request that writes settings; its reply payload is empty.
pub trait Command {
    const CODE: u8;

    fn encode(&self, dst: &mut BytesMut);
}

/// Fail with [`ClientError::ShortPayload`] unless `payload` holds `expected` bytes.
pub(crate) fn ensure_len(code: u8, payload: &[u8], expected: usize) -> Result<()> {
    if payload.len() < expected {
        return Err(ClientError::ShortPayload {
            code,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}
