//! MSP v1 message codes.

pub const IDENT: u8 = 100;
pub const STATUS: u8 = 101;
pub const RAW_IMU: u8 = 102;
pub const SERVO: u8 = 103;
pub const MOTOR: u8 = 104;
pub const RC: u8 = 105;
pub const RAW_GPS: u8 = 106;
pub const COMP_GPS: u8 = 107;
pub const ATTITUDE: u8 = 108;
pub const ALTITUDE: u8 = 109;
pub const ANALOG: u8 = 110;
pub const RC_TUNING: u8 = 111;
pub const PID: u8 = 112;
pub const BOX: u8 = 113;
pub const MISC: u8 = 114;
pub const MOTOR_PINS: u8 = 115;
pub const BOX_NAMES: u8 = 116;
pub const PID_NAMES: u8 = 117;
pub const WP: u8 = 118;
pub const BOX_IDS: u8 = 119;
pub const SERVO_CONF: u8 = 120;

pub const SET_RAW_RC: u8 = 200;
pub const SET_RAW_GPS: u8 = 201;
pub const SET_PID: u8 = 202;
pub const SET_BOX: u8 = 203;
pub const SET_RC_TUNING: u8 = 204;
pub const ACC_CALIBRATION: u8 = 205;
pub const MAG_CALIBRATION: u8 = 206;
pub const SET_MISC: u8 = 207;
pub const RESET_CONF: u8 = 208;
pub const SET_WP: u8 = 209;
pub const SELECT_SETTING: u8 = 210;
pub const SET_HEAD: u8 = 211;
pub const SET_SERVO_CONF: u8 = 212;
