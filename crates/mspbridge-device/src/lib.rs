//! Serialized access to one MSP device.
//!
//! A serial flight controller answers one request at a time. This crate
//! keeps at most one request in flight, queues the rest in FIFO order and
//! gives up on a request after a per-request wait.
//!
//! - [`Dispatcher`] is the sans-IO state machine, reused by the tunnel bridge.
//! - [`Device`] is a handle to a tokio task that owns the serial stream.

pub mod device;
pub mod dispatch;
pub mod error;
pub mod reply;

pub use device::{reply_deadline, Device, DeviceConfig, DEFAULT_WAIT, MAX_WAIT};
pub use dispatch::{Dispatcher, PendingRequest, Resolved};
pub use error::{DeviceError, Result};
pub use reply::{AbandonReason, Reply};
