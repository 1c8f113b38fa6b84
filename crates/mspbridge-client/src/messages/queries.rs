use bytes::Buf;
use serde::Serialize;

use super::codes;
use super::{ensure_len, Query};
use crate::error::Result;

/// Number of servo and motor slots reported by MultiWii.
pub const SERVO_COUNT: usize = 8;

/// Firmware identification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Ident {
    pub version: u8,
    pub multi_type: u8,
    pub msp_version: u8,
    pub capability: u32,
}

impl Query for Ident {
    const CODE: u8 = codes::IDENT;
    const NAME: &'static str = "ident";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, 7)?;
        let mut buf = payload;
        Ok(Self {
            version: buf.get_u8(),
            multi_type: buf.get_u8(),
            msp_version: buf.get_u8(),
            capability: buf.get_u32_le(),
        })
    }
}

/// Cycle time, sensors and active flight modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Main loop time in microseconds.
    pub cycle_time: u16,
    pub i2c_error_count: u16,
    /// Bitmask: acc, baro, mag, gps, sonar.
    pub sensor_present: u16,
    /// One bit per box, in [`BoxIds`] order.
    pub box_activation: u32,
    pub current_setting: u8,
}

impl Query for Status {
    const CODE: u8 = codes::STATUS;
    const NAME: &'static str = "status";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, 11)?;
        let mut buf = payload;
        Ok(Self {
            cycle_time: buf.get_u16_le(),
            i2c_error_count: buf.get_u16_le(),
            sensor_present: buf.get_u16_le(),
            box_activation: buf.get_u32_le(),
            current_setting: buf.get_u8(),
        })
    }
}

/// A signed three-axis sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Axes {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Axes {
    fn read(buf: &mut &[u8]) -> Self {
        Self {
            x: buf.get_i16_le(),
            y: buf.get_i16_le(),
            z: buf.get_i16_le(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RawImu {
    pub gyro: Axes,
    pub acc: Axes,
    pub mag: Axes,
}

impl Query for RawImu {
    const CODE: u8 = codes::RAW_IMU;
    const NAME: &'static str = "raw-imu";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, 18)?;
        let mut buf = payload;
        Ok(Self {
            gyro: Axes::read(&mut buf),
            acc: Axes::read(&mut buf),
            mag: Axes::read(&mut buf),
        })
    }
}

fn read_u16_slots(code: u8, payload: &[u8]) -> Result<[u16; SERVO_COUNT]> {
    ensure_len(code, payload, SERVO_COUNT * 2)?;
    let mut buf = payload;
    let mut slots = [0u16; SERVO_COUNT];
    for slot in &mut slots {
        *slot = buf.get_u16_le();
    }
    Ok(slots)
}

/// Servo outputs in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Servos(pub [u16; SERVO_COUNT]);

impl Query for Servos {
    const CODE: u8 = codes::SERVO;
    const NAME: &'static str = "servo";

    fn decode(payload: &[u8]) -> Result<Self> {
        read_u16_slots(Self::CODE, payload).map(Self)
    }
}

/// Motor outputs in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Motors(pub [u16; SERVO_COUNT]);

impl Query for Motors {
    const CODE: u8 = codes::MOTOR;
    const NAME: &'static str = "motor";

    fn decode(payload: &[u8]) -> Result<Self> {
        read_u16_slots(Self::CODE, payload).map(Self)
    }
}

/// RC channel values, also the payload of [`super::SetRawRc`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RcChannels {
    pub roll: u16,
    pub pitch: u16,
    pub yaw: u16,
    pub throttle: u16,
    pub aux1: u16,
    pub aux2: u16,
    pub aux3: u16,
    pub aux4: u16,
}

impl Query for RcChannels {
    const CODE: u8 = codes::RC;
    const NAME: &'static str = "rc";

    fn decode(payload: &[u8]) -> Result<Self> {
        let [roll, pitch, yaw, throttle, aux1, aux2, aux3, aux4] =
            read_u16_slots(Self::CODE, payload)?;
        Ok(Self {
            roll,
            pitch,
            yaw,
            throttle,
            aux1,
            aux2,
            aux3,
            aux4,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RawGps {
    pub fix: u8,
    pub num_sat: u8,
    /// Degrees * 10^7.
    pub latitude: u32,
    pub longitude: u32,
    /// Meters.
    pub altitude: u16,
    /// cm/s.
    pub speed: u16,
    /// Degrees * 10.
    pub ground_course: u16,
}

impl Query for RawGps {
    const CODE: u8 = codes::RAW_GPS;
    const NAME: &'static str = "raw-gps";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, 16)?;
        let mut buf = payload;
        Ok(Self {
            fix: buf.get_u8(),
            num_sat: buf.get_u8(),
            latitude: buf.get_u32_le(),
            longitude: buf.get_u32_le(),
            altitude: buf.get_u16_le(),
            speed: buf.get_u16_le(),
            ground_course: buf.get_u16_le(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompGps {
    pub distance_to_home: u16,
    pub direction_to_home: u16,
    pub update: u8,
}

impl Query for CompGps {
    const CODE: u8 = codes::COMP_GPS;
    const NAME: &'static str = "comp-gps";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, 5)?;
        let mut buf = payload;
        Ok(Self {
            distance_to_home: buf.get_u16_le(),
            direction_to_home: buf.get_u16_le(),
            update: buf.get_u8(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Attitude {
    /// Roll in tenths of a degree.
    pub angle_x: i16,
    /// Pitch in tenths of a degree.
    pub angle_y: i16,
    /// Degrees.
    pub heading: i16,
}

impl Query for Attitude {
    const CODE: u8 = codes::ATTITUDE;
    const NAME: &'static str = "attitude";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, 6)?;
        let mut buf = payload;
        Ok(Self {
            angle_x: buf.get_i16_le(),
            angle_y: buf.get_i16_le(),
            heading: buf.get_i16_le(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Altitude {
    /// Centimeters.
    pub estimated: i32,
    /// cm/s.
    pub vario: i16,
}

impl Query for Altitude {
    const CODE: u8 = codes::ALTITUDE;
    const NAME: &'static str = "altitude";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, 6)?;
        let mut buf = payload;
        Ok(Self {
            estimated: buf.get_i32_le(),
            vario: buf.get_i16_le(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Analog {
    /// Tenths of a volt.
    pub vbat: u8,
    pub power_meter_sum: u16,
    pub rssi: u16,
    pub amperage: u16,
}

impl Query for Analog {
    const CODE: u8 = codes::ANALOG;
    const NAME: &'static str = "analog";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, 7)?;
        let mut buf = payload;
        Ok(Self {
            vbat: buf.get_u8(),
            power_meter_sum: buf.get_u16_le(),
            rssi: buf.get_u16_le(),
            amperage: buf.get_u16_le(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RcTuning {
    pub rc_rate: u8,
    pub rc_expo: u8,
    pub roll_pitch_rate: u8,
    pub yaw_rate: u8,
    pub dyn_throttle_pid: u8,
    pub throttle_mid: u8,
    pub throttle_expo: u8,
}

impl RcTuning {
    pub(crate) const SIZE: usize = 7;
}

impl Query for RcTuning {
    const CODE: u8 = codes::RC_TUNING;
    const NAME: &'static str = "rc-tuning";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, Self::SIZE)?;
        let mut buf = payload;
        Ok(Self {
            rc_rate: buf.get_u8(),
            rc_expo: buf.get_u8(),
            roll_pitch_rate: buf.get_u8(),
            yaw_rate: buf.get_u8(),
            dyn_throttle_pid: buf.get_u8(),
            throttle_mid: buf.get_u8(),
            throttle_expo: buf.get_u8(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PidTerm {
    pub p: u8,
    pub i: u8,
    pub d: u8,
}

impl PidTerm {
    fn read(buf: &mut &[u8]) -> Self {
        Self {
            p: buf.get_u8(),
            i: buf.get_u8(),
            d: buf.get_u8(),
        }
    }
}

/// PID gains for every controller, in wire order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pid {
    pub roll: PidTerm,
    pub pitch: PidTerm,
    pub yaw: PidTerm,
    pub alt: PidTerm,
    pub pos: PidTerm,
    pub posr: PidTerm,
    pub navr: PidTerm,
    pub level: PidTerm,
    pub mag: PidTerm,
    pub vel: PidTerm,
}

impl Pid {
    pub(crate) const SIZE: usize = 30;

    pub(crate) fn terms(&self) -> [PidTerm; 10] {
        [
            self.roll, self.pitch, self.yaw, self.alt, self.pos, self.posr, self.navr, self.level,
            self.mag, self.vel,
        ]
    }
}

impl Query for Pid {
    const CODE: u8 = codes::PID;
    const NAME: &'static str = "pid";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, Self::SIZE)?;
        let mut buf = payload;
        Ok(Self {
            roll: PidTerm::read(&mut buf),
            pitch: PidTerm::read(&mut buf),
            yaw: PidTerm::read(&mut buf),
            alt: PidTerm::read(&mut buf),
            pos: PidTerm::read(&mut buf),
            posr: PidTerm::read(&mut buf),
            navr: PidTerm::read(&mut buf),
            level: PidTerm::read(&mut buf),
            mag: PidTerm::read(&mut buf),
            vel: PidTerm::read(&mut buf),
        })
    }
}

/// Activation masks, one `u16` per box.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoxItems(pub Vec<u16>);

impl Query for BoxItems {
    const CODE: u8 = codes::BOX;
    const NAME: &'static str = "box";

    fn decode(payload: &[u8]) -> Result<Self> {
        // A trailing odd byte cannot form an item and is ignored.
        let items = payload
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self(items))
    }
}

/// Miscellaneous configuration, also the payload of [`super::SetMisc`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Misc {
    pub power_trigger: u16,
    pub min_throttle: u16,
    pub max_throttle: u16,
    pub min_command: u16,
    pub failsafe_throttle: u16,
    pub arm_count: u16,
    /// Seconds armed over the board's lifetime.
    pub lifetime: u32,
    pub mag_declination: u16,
    pub vbat_scale: u8,
    pub vbat_warn1: u8,
    pub vbat_warn2: u8,
    pub vbat_crit: u8,
}

impl Misc {
    pub(crate) const SIZE: usize = 22;
}

impl Query for Misc {
    const CODE: u8 = codes::MISC;
    const NAME: &'static str = "misc";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, Self::SIZE)?;
        let mut buf = payload;
        Ok(Self {
            power_trigger: buf.get_u16_le(),
            min_throttle: buf.get_u16_le(),
            max_throttle: buf.get_u16_le(),
            min_command: buf.get_u16_le(),
            failsafe_throttle: buf.get_u16_le(),
            arm_count: buf.get_u16_le(),
            lifetime: buf.get_u32_le(),
            mag_declination: buf.get_u16_le(),
            vbat_scale: buf.get_u8(),
            vbat_warn1: buf.get_u8(),
            vbat_warn2: buf.get_u8(),
            vbat_crit: buf.get_u8(),
        })
    }
}

/// Output pin for each motor slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MotorPins(pub [u8; SERVO_COUNT]);

impl Query for MotorPins {
    const CODE: u8 = codes::MOTOR_PINS;
    const NAME: &'static str = "motor-pins";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, SERVO_COUNT)?;
        let mut pins = [0u8; SERVO_COUNT];
        pins.copy_from_slice(&payload[..SERVO_COUNT]);
        Ok(Self(pins))
    }
}

fn split_names(payload: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(payload)
        .split(';')
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoxNames(pub Vec<String>);

impl Query for BoxNames {
    const CODE: u8 = codes::BOX_NAMES;
    const NAME: &'static str = "box-names";

    fn decode(payload: &[u8]) -> Result<Self> {
        Ok(Self(split_names(payload)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PidNames(pub Vec<String>);

impl Query for PidNames {
    const CODE: u8 = codes::PID_NAMES;
    const NAME: &'static str = "pid-names";

    fn decode(payload: &[u8]) -> Result<Self> {
        Ok(Self(split_names(payload)))
    }
}

/// A navigation waypoint, also the payload of [`super::SetWaypoint`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Waypoint {
    pub number: u8,
    pub latitude: u32,
    pub longitude: u32,
    pub alt_hold: u32,
    pub heading: u16,
    pub time_to_stay: u16,
    pub nav_flag: u8,
}

impl Waypoint {
    pub(crate) const SIZE: usize = 18;
}

impl Query for Waypoint {
    const CODE: u8 = codes::WP;
    const NAME: &'static str = "wp";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, Self::SIZE)?;
        let mut buf = payload;
        Ok(Self {
            number: buf.get_u8(),
            latitude: buf.get_u32_le(),
            longitude: buf.get_u32_le(),
            alt_hold: buf.get_u32_le(),
            heading: buf.get_u16_le(),
            time_to_stay: buf.get_u16_le(),
            nav_flag: buf.get_u8(),
        })
    }
}

/// Permanent box identifiers, in [`Status::box_activation`] bit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoxIds(pub Vec<u8>);

impl Query for BoxIds {
    const CODE: u8 = codes::BOX_IDS;
    const NAME: &'static str = "box-ids";

    fn decode(payload: &[u8]) -> Result<Self> {
        Ok(Self(payload.to_vec()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServoConfig {
    pub min: u16,
    pub max: u16,
    pub middle: u16,
    pub rate: u8,
}

impl ServoConfig {
    pub(crate) const SIZE: usize = 7;
}

/// Configuration of all servo slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServoConf(pub [ServoConfig; SERVO_COUNT]);

impl Query for ServoConf {
    const CODE: u8 = codes::SERVO_CONF;
    const NAME: &'static str = "servo-conf";

    fn decode(payload: &[u8]) -> Result<Self> {
        ensure_len(Self::CODE, payload, ServoConfig::SIZE * SERVO_COUNT)?;
        let mut buf = payload;
        let mut servos = [ServoConfig::default(); SERVO_COUNT];
        for servo in &mut servos {
            *servo = ServoConfig {
                min: buf.get_u16_le(),
                max: buf.get_u16_le(),
                middle: buf.get_u16_le(),
                rate: buf.get_u8(),
            };
        }
        Ok(Self(servos))
    }
}
