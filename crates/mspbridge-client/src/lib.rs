//! Typed access to a MultiWii flight controller.
//!
//! [`messages`] holds the per-code payload layouts. [`MspClient`] sends them
//! through a [`mspbridge_device::Device`] and turns abandoned requests into
//! errors.

pub mod client;
pub mod error;
pub mod messages;

pub use client::MspClient;
pub use error::{ClientError, Result};
pub use messages::{Command, Query};
