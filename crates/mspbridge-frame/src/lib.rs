//! MSP v1 framing for the device link and the multiplexed TCP tunnel.
//!
//! Two sibling wire formats share one resynchronizing scanner:
//! - Device frames: `'$' 'M' dir length code payload checksum`
//! - Tunnel frames: `'$' 'M' dir length id code payload checksum`
//!
//! The checksum is the XOR of `length`, `code` and every payload byte. The
//! tunnel `id` is not covered. Malformed input never surfaces as an error:
//! decoders skip forward until they find a frame that validates.

pub mod codec;
pub mod decoder;
pub mod error;
mod scan;
pub mod tunnel;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::{MspCodec, TunnelCodec};
pub use codec::{
    checksum, decode_frame, encode_frame, encode_request, Direction, Frame, CHECKSUM_SIZE,
    DEVICE_DIRECTIONS, HEADER_SIZE, MAX_PAYLOAD, PREAMBLE,
};
pub use decoder::{DecodeStats, FrameDecoder, TunnelDecoder};
pub use error::{FrameError, Result};
pub use tunnel::{decode_tunnel_frame, encode_tunnel_frame, TunnelFrame, TUNNEL_HEADER_SIZE};
