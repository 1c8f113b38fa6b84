use std::time::Duration;

use bytes::Bytes;

/// Default wait for a serial reply before moving to the next request.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(1000);

/// What the bridge does with TCP bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BridgeMode {
    /// Decode tunnel frames and multiplex them onto the serial device.
    #[default]
    Multiplexed,
    /// Copy raw bytes both ways.
    Passthrough {
        /// Written to the peer after every successful connect.
        handshake: Option<Bytes>,
    },
}

/// How a serial reply is matched to the in-flight tunnel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Correlation {
    /// Any reply settles the in-flight request and carries its id. A reply
    /// that arrives after its request timed out is delivered under the id
    /// of whatever request is in flight at that moment.
    #[default]
    Positional,
    /// A reply settles the in-flight request only if its code matches;
    /// other replies are dropped.
    StrictCode,
}

/// What the link does after the TCP connection closes or fails to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Retry at once, forever.
    #[default]
    Immediate,
    /// Wait `initial`, doubling after each failure up to `max`. A successful
    /// connect resets the wait.
    Backoff { initial: Duration, max: Duration },
}

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub mode: BridgeMode,
    /// Per-request serial reply wait (multiplexed mode).
    pub reply_timeout: Duration,
    pub correlation: Correlation,
    pub reconnect: ReconnectPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mode: BridgeMode::default(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            correlation: Correlation::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}
