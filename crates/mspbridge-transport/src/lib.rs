//! Byte-stream transports for mspbridge.
//!
//! Two kinds of endpoints are provided:
//! - a TCP client connector for the tunnel side
//! - a serial port opener for the flight controller side
//!
//! Everything above this layer only sees [`ByteStream`]s, so tests can
//! substitute in-memory pipes for either end.

pub mod error;
#[cfg(feature = "serial")]
pub mod serial;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialStream, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};
pub use tcp::{TcpConnector, DEFAULT_TCP_HOST, DEFAULT_TCP_PORT};
pub use traits::{ByteStream, Connector};
