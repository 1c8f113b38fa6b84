use bytes::{BufMut, BytesMut};

use super::codes;
use super::queries::{Misc, Pid, RcChannels, RcTuning, ServoConfig, Waypoint, SERVO_COUNT};
use super::Command;

impl RcChannels {
    fn put(&self, dst: &mut BytesMut) {
        for value in [
            self.roll,
            self.pitch,
            self.yaw,
            self.throttle,
            self.aux1,
            self.aux2,
            self.aux3,
            self.aux4,
        ] {
            dst.put_u16_le(value);
        }
    }
}

/// Override RC inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRawRc(pub RcChannels);

impl Command for SetRawRc {
    const CODE: u8 = codes::SET_RAW_RC;

    fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(16);
        self.0.put(dst);
    }
}

/// Inject a GPS fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetRawGps {
    pub fix: u8,
    pub num_sat: u8,
    pub latitude: u32,
    pub longitude: u32,
    pub altitude: u16,
    pub speed: u16,
}

impl Command for SetRawGps {
    const CODE: u8 = codes::SET_RAW_GPS;

    fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(14);
        dst.put_u8(self.fix);
        dst.put_u8(self.num_sat);
        dst.put_u32_le(self.latitude);
        dst.put_u32_le(self.longitude);
        dst.put_u16_le(self.altitude);
        dst.put_u16_le(self.speed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPid(pub Pid);

impl Command for SetPid {
    const CODE: u8 = codes::SET_PID;

    fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(Pid::SIZE);
        for term in self.0.terms() {
            dst.put_slice(&[term.p, term.i, term.d]);
        }
    }
}

/// Activation masks, one per box, in [`super::BoxItems`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBox(pub Vec<u16>);

impl Command for SetBox {
    const CODE: u8 = codes::SET_BOX;

    fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.0.len() * 2);
        for item in &self.0 {
            dst.put_u16_le(*item);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRcTuning(pub RcTuning);

impl Command for SetRcTuning {
    const CODE: u8 = codes::SET_RC_TUNING;

    fn encode(&self, dst: &mut BytesMut) {
        let t = &self.0;
        dst.reserve(RcTuning::SIZE);
        dst.put_slice(&[
            t.rc_rate,
            t.rc_expo,
            t.roll_pitch_rate,
            t.yaw_rate,
            t.dyn_throttle_pid,
            t.throttle_mid,
            t.throttle_expo,
        ]);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccCalibration;

impl Command for AccCalibration {
    const CODE: u8 = codes::ACC_CALIBRATION;

    fn encode(&self, _dst: &mut BytesMut) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MagCalibration;

impl Command for MagCalibration {
    const CODE: u8 = codes::MAG_CALIBRATION;

    fn encode(&self, _dst: &mut BytesMut) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetMisc(pub Misc);

impl Command for SetMisc {
    const CODE: u8 = codes::SET_MISC;

    fn encode(&self, dst: &mut BytesMut) {
        let m = &self.0;
        dst.reserve(Misc::SIZE);
        dst.put_u16_le(m.power_trigger);
        dst.put_u16_le(m.min_throttle);
        dst.put_u16_le(m.max_throttle);
        dst.put_u16_le(m.min_command);
        dst.put_u16_le(m.failsafe_throttle);
        dst.put_u16_le(m.arm_count);
        dst.put_u32_le(m.lifetime);
        dst.put_u16_le(m.mag_declination);
        dst.put_slice(&[m.vbat_scale, m.vbat_warn1, m.vbat_warn2, m.vbat_crit]);
    }
}

/// Restore firmware defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetConf;

impl Command for ResetConf {
    const CODE: u8 = codes::RESET_CONF;

    fn encode(&self, _dst: &mut BytesMut) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetWaypoint(pub Waypoint);

impl Command for SetWaypoint {
    const CODE: u8 = codes::SET_WP;

    fn encode(&self, dst: &mut BytesMut) {
        let wp = &self.0;
        dst.reserve(Waypoint::SIZE);
        dst.put_u8(wp.number);
        dst.put_u32_le(wp.latitude);
        dst.put_u32_le(wp.longitude);
        dst.put_u32_le(wp.alt_hold);
        dst.put_u16_le(wp.heading);
        dst.put_u16_le(wp.time_to_stay);
        dst.put_u8(wp.nav_flag);
    }
}

/// Switch the active settings profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectSetting(pub u8);

impl Command for SelectSetting {
    const CODE: u8 = codes::SELECT_SETTING;

    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.0);
    }
}

/// Set the heading-hold target in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetHead(pub i16);

impl Command for SetHead {
    const CODE: u8 = codes::SET_HEAD;

    fn encode(&self, dst: &mut BytesMut) {
        dst.put_i16_le(self.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetServoConf(pub [ServoConfig; SERVO_COUNT]);

impl Command for SetServoConf {
    const CODE: u8 = codes::SET_SERVO_CONF;

    fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(ServoConfig::SIZE * SERVO_COUNT);
        for servo in &self.0 {
            dst.put_u16_le(servo.min);
            dst.put_u16_le(servo.max);
            dst.put_u16_le(servo.middle);
            dst.put_u8(servo.rate);
        }
    }
}
