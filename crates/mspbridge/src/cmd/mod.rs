use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use mspbridge_client::MspClient;
use mspbridge_device::{Device, DeviceConfig};

use crate::config::FileConfig;
use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod bridge;
pub mod query;
pub mod send;
pub mod version;

/// What every subcommand gets besides its own arguments.
pub struct Context {
    pub format: OutputFormat,
    pub file: FileConfig,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bridge the serial flight controller to a TCP endpoint.
    Bridge(BridgeArgs),
    /// Query the flight controller directly and print the decoded reply.
    Query(QueryArgs),
    /// Send a raw MSP request and print the reply payload.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Bridge(args) => bridge::run(args, ctx).await,
        Command::Query(args) => query::run(args, ctx).await,
        Command::Send(args) => send::run(args, ctx).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct TcpArgs {
    /// Tunnel host to connect to.
    #[arg(long, env = "MSPBRIDGE_HOST")]
    pub host: Option<String>,
    /// Tunnel port.
    #[arg(long, env = "MSPBRIDGE_PORT")]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial device path.
    #[arg(long, value_name = "PATH", env = "MSPBRIDGE_SERIAL")]
    pub serial: Option<PathBuf>,
    /// Serial baud rate.
    #[arg(long, env = "MSPBRIDGE_BAUD")]
    pub baud: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Decode tunnel frames and multiplex them onto the serial port.
    Multiplexed,
    /// Copy raw bytes both ways.
    Passthrough,
}

#[derive(Args, Debug)]
pub struct BridgeArgs {
    #[command(flatten)]
    pub tcp: TcpArgs,
    #[command(flatten)]
    pub serial: SerialArgs,
    /// How TCP bytes are handled.
    #[arg(long, value_enum, default_value = "multiplexed")]
    pub mode: ModeArg,
    /// Text sent to the peer after every connect (passthrough only).
    #[arg(long)]
    pub handshake: Option<String>,
    /// Wait for each serial reply (e.g. 1s, 500ms).
    #[arg(long, default_value = "1000ms")]
    pub reply_timeout: String,
    /// Only accept a serial reply whose code matches the in-flight request.
    #[arg(long)]
    pub strict_code_match: bool,
    /// Back off between reconnect attempts instead of retrying at once.
    #[arg(long, value_name = "INITIAL,MAX")]
    pub reconnect_backoff: Option<String>,
}

/// Messages `query` can decode. Names match the message table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum QueryName {
    Ident,
    Status,
    RawImu,
    Servo,
    Motor,
    Rc,
    RawGps,
    CompGps,
    Attitude,
    Altitude,
    Analog,
    RcTuning,
    Pid,
    Box,
    Misc,
    MotorPins,
    BoxNames,
    PidNames,
    Wp,
    BoxIds,
    ServoConf,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Message to request.
    #[arg(value_enum)]
    pub name: QueryName,
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Wait for the reply (e.g. 1s, 500ms).
    #[arg(long, default_value = "1000ms")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// MSP message code.
    pub code: u8,
    /// Request payload as hex, e.g. `d3ff`.
    #[arg(long)]
    pub data: Option<String>,
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Wait for the reply (e.g. 1s, 500ms).
    #[arg(long, default_value = "1000ms")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the serial port and start a device task on it.
pub(crate) fn open_client(serial: SerialArgs, timeout: &str, ctx: &Context) -> CliResult<MspClient> {
    let default_wait = parse_duration(timeout)?;
    let serial = ctx.file.serial_config(serial.serial, serial.baud);
    let stream = serial
        .open()
        .map_err(|err| transport_error("failed to open serial port", err))?;
    let (device, _task) = Device::spawn(stream, DeviceConfig { default_wait });
    Ok(MspClient::new(device))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Decode a hex payload. Whitespace between bytes is ignored.
pub(crate) fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input.split_whitespace().collect();
    hex::decode(digits)
        .map_err(|err| CliError::new(USAGE, format!("invalid hex payload {input:?}: {err}")))
}
