use bytes::{Bytes, BytesMut};
use mspbridge_device::{Device, Reply};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::messages::*;

/// Typed MSP client over a [`Device`].
///
/// Every call goes through the device's single-in-flight queue, so one
/// client can be cloned and used from many tasks.
#[derive(Debug, Clone)]
pub struct MspClient {
    device: Device,
}

impl MspClient {
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Send a raw request and return the reply payload.
    pub async fn raw(&self, code: u8, payload: impl Into<Bytes>) -> Result<Bytes> {
        match self.device.request(code, payload).await? {
            Reply::Payload(payload) => Ok(payload),
            Reply::Abandoned(reason) => {
                debug!(code, %reason, "request abandoned");
                Err(ClientError::Abandoned(reason))
            }
        }
    }

    /// Send `Q`'s request and decode the reply.
    pub async fn query<Q: Query>(&self) -> Result<Q> {
        let payload = self.raw(Q::CODE, Bytes::new()).await?;
        Q::decode(&payload)
    }

    /// Send a command and wait for its acknowledgement.
    pub async fn command<C: Command>(&self, cmd: &C) -> Result<()> {
        let mut payload = BytesMut::new();
        cmd.encode(&mut payload);
        self.raw(C::CODE, payload.freeze()).await?;
        Ok(())
    }

    pub async fn ident(&self) -> Result<Ident> {
        self.query().await
    }

    pub async fn status(&self) -> Result<Status> {
        self.query().await
    }

    pub async fn raw_imu(&self) -> Result<RawImu> {
        self.query().await
    }

    pub async fn servo(&self) -> Result<Servos> {
        self.query().await
    }

    pub async fn motor(&self) -> Result<Motors> {
        self.query().await
    }

    pub async fn rc(&self) -> Result<RcChannels> {
        self.query().await
    }

    pub async fn raw_gps(&self) -> Result<RawGps> {
        self.query().await
    }

    pub async fn comp_gps(&self) -> Result<CompGps> {
        self.query().await
    }

    pub async fn attitude(&self) -> Result<Attitude> {
        self.query().await
    }

    pub async fn altitude(&self) -> Result<Altitude> {
        self.query().await
    }

    pub async fn analog(&self) -> Result<Analog> {
        self.query().await
    }

    pub async fn rc_tuning(&self) -> Result<RcTuning> {
        self.query().await
    }

    pub async fn pid(&self) -> Result<Pid> {
        self.query().await
    }

    pub async fn box_items(&self) -> Result<BoxItems> {
        self.query().await
    }

    pub async fn misc(&self) -> Result<Misc> {
        self.query().await
    }

    pub async fn motor_pins(&self) -> Result<MotorPins> {
        self.query().await
    }

    pub async fn box_names(&self) -> Result<BoxNames> {
        self.query().await
    }

    pub async fn pid_names(&self) -> Result<PidNames> {
        self.query().await
    }

    pub async fn waypoint(&self) -> Result<Waypoint> {
        self.query().await
    }

    pub async fn box_ids(&self) -> Result<BoxIds> {
        self.query().await
    }

    pub async fn servo_conf(&self) -> Result<ServoConf> {
        self.query().await
    }

    pub async fn set_raw_rc(&self, channels: RcChannels) -> Result<()> {
        self.command(&SetRawRc(channels)).await
    }

    pub async fn set_raw_gps(&self, gps: SetRawGps) -> Result<()> {
        self.command(&gps).await
    }

    pub async fn set_pid(&self, pid: Pid) -> Result<()> {
        self.command(&SetPid(pid)).await
    }

    pub async fn set_box(&self, items: Vec<u16>) -> Result<()> {
        self.command(&SetBox(items)).await
    }

    pub async fn set_rc_tuning(&self, tuning: RcTuning) -> Result<()> {
        self.command(&SetRcTuning(tuning)).await
    }

    pub async fn acc_calibration(&self) -> Result<()> {
        self.command(&AccCalibration).await
    }

    pub async fn mag_calibration(&self) -> Result<()> {
        self.command(&MagCalibration).await
    }

    pub async fn set_misc(&self, misc: Misc) -> Result<()> {
        self.command(&SetMisc(misc)).await
    }

    pub async fn reset_conf(&self) -> Result<()> {
        self.command(&ResetConf).await
    }

    pub async fn set_waypoint(&self, wp: Waypoint) -> Result<()> {
        self.command(&SetWaypoint(wp)).await
    }

    pub async fn select_setting(&self, setting: u8) -> Result<()> {
        self.command(&SelectSetting(setting)).await
    }

    pub async fn set_head(&self, heading: i16) -> Result<()> {
        self.command(&SetHead(heading)).await
    }

    pub async fn set_servo_conf(&self, servos: [ServoConfig; SERVO_COUNT]) -> Result<()> {
        self.command(&SetServoConf(servos)).await
    }
}
