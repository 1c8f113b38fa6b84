//! The optional JSON config file.
//!
//! ```json
//! {
//!   "api": "",
//!   "tcp": { "host": "10.10.10.1", "port": 3002 },
//!   "serial": { "port": "/dev/ttyAMA0", "baudRate": 115200 }
//! }
//! ```
//!
//! Every key is optional. Values here override the built-in defaults and
//! are themselves overridden by environment variables and flags.

use std::path::{Path, PathBuf};

use mspbridge_transport::{
    SerialConfig, TcpConnector, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH, DEFAULT_TCP_HOST,
    DEFAULT_TCP_PORT,
};
use serde::Deserialize;

use crate::exit::{CliError, CliResult, DATA_INVALID, USAGE};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Sent to the peer after every connect in passthrough mode, unless
    /// `--handshake` is given. Empty means none.
    pub api: Option<String>,
    pub tcp: TcpSection,
    pub serial: SerialSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TcpSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerialSection {
    pub port: Option<PathBuf>,
    pub baud_rate: Option<u32>,
}

impl FileConfig {
    /// Resolve the tunnel endpoint; `host` and `port` come from flags or env.
    pub fn tcp_connector(&self, host: Option<String>, port: Option<u16>) -> TcpConnector {
        let host = host
            .or_else(|| self.tcp.host.clone())
            .unwrap_or_else(|| DEFAULT_TCP_HOST.to_string());
        let port = port.or(self.tcp.port).unwrap_or(DEFAULT_TCP_PORT);
        TcpConnector::new(host, port)
    }

    pub fn serial_config(&self, path: Option<PathBuf>, baud_rate: Option<u32>) -> SerialConfig {
        let path = path
            .or_else(|| self.serial.port.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SERIAL_PATH));
        let baud_rate = baud_rate
            .or(self.serial.baud_rate)
            .unwrap_or(DEFAULT_BAUD_RATE);
        SerialConfig::new(path, baud_rate)
    }

    pub fn api_handshake(&self) -> Option<&str> {
        self.api.as_deref().filter(|key| !key.is_empty())
    }
}

/// Read `path`, or return the empty config when no file was given.
pub fn load(path: Option<&Path>) -> CliResult<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|err| {
        CliError::new(USAGE, format!("failed reading {}: {err}", path.display()))
    })?;
    parse(&text).map_err(|err| CliError::new(err.code, format!("{}: {err}", path.display())))
}

fn parse(text: &str) -> CliResult<FileConfig> {
    serde_json::from_str(text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid config file: {err}")))
}
