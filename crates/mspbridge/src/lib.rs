//! Serial-to-TCP bridge for MultiWii (MSP v1) flight controllers.
//!
//! This crate re-exports the workspace crates under one roof and ships the
//! `mspbridge` binary.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connector and serial port opener
//! - [`frame`]: MSP and tunnel framing with resynchronization
//! - [`device`]: single-in-flight request queue for one serial device
//! - [`client`]: typed queries and commands
//! - [`bridge`]: the TCP tunnel, multiplexed or passthrough

/// Re-export transport types.
pub mod transport {
    pub use mspbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mspbridge_frame::*;
}

/// Re-export device types.
pub mod device {
    pub use mspbridge_device::*;
}

/// Re-export client types.
pub mod client {
    pub use mspbridge_client::*;
}

/// Re-export bridge types.
pub mod bridge {
    pub use mspbridge_bridge::*;
}
