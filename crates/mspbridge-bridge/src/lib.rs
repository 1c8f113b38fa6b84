//! TCP-to-serial tunnel for MSP.
//!
//! A remote peer connects over TCP and sends tunnel frames: MSP requests
//! carrying an extra one-byte id. The bridge queues them onto the serial
//! flight controller one at a time and returns each reply under the id of
//! the request it answered. A passthrough mode copies raw bytes instead.
//!
//! The TCP side is owned by a link task that reconnects on close according
//! to the configured [`ReconnectPolicy`].

mod backoff;
pub mod bridge;
pub mod config;
pub mod error;
mod link;

pub use bridge::Bridge;
pub use config::{BridgeConfig, BridgeMode, Correlation, ReconnectPolicy, DEFAULT_REPLY_TIMEOUT};
pub use error::{BridgeError, Result};
