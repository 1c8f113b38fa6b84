//! Tunnel framing used on the TCP side of the bridge.
//!
//! Identical to the device layout except for a one-byte multiplexing `id`
//! between `length` and `code`. The id lets one TCP connection carry many
//! outstanding requests. It is excluded from the checksum.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{checksum, payload_length, Direction, CHECKSUM_SIZE, PREAMBLE};
use crate::decoder::DecodeStats;
use crate::error::Result;
use crate::scan;

/// Tunnel header: preamble (2) + direction (1) + length (1) + id (1) + code (1).
pub const TUNNEL_HEADER_SIZE: usize = 6;

const ID_OFFSET: usize = 4;

/// A checksum-verified tunnel frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelFrame {
    pub direction: Direction,
    /// Caller-chosen correlation token.
    pub id: u8,
    pub code: u8,
    pub payload: Bytes,
}

impl TunnelFrame {
    pub fn new(direction: Direction, id: u8, code: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            direction,
            id,
            code,
            payload: payload.into(),
        }
    }

    /// A request travelling from the tunnel peer toward the device (`'$M<'`).
    pub fn request(id: u8, code: u8, payload: impl Into<Bytes>) -> Self {
        Self::new(Direction::Request, id, code, payload)
    }

    /// A reply travelling back to the tunnel peer (`'$M>'`).
    pub fn reply(id: u8, code: u8, payload: impl Into<Bytes>) -> Self {
        Self::new(Direction::Response, id, code, payload)
    }

    pub fn wire_size(&self) -> usize {
        TUNNEL_HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }
}

/// Encode a tunnel frame.
///
/// Wire format:
/// ```text
/// ┌──────────┬─────┬────────┬────┬──────┬────────────┬──────────┐
/// │ '$' 'M'  │ dir │ length │ id │ code │ payload    │ checksum │
/// └──────────┴─────┴────────┴────┴──────┴────────────┴──────────┘
/// ```
pub fn encode_tunnel_frame(
    direction: Direction,
    id: u8,
    code: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let length = payload_length(payload)?;
    dst.reserve(TUNNEL_HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
    dst.put_slice(&PREAMBLE);
    dst.put_u8(direction.as_byte());
    dst.put_u8(length);
    dst.put_u8(id);
    dst.put_u8(code);
    dst.put_slice(payload);
    dst.put_u8(checksum(length, code, payload));
    Ok(())
}

/// Decode the next tunnel frame, resynchronizing past garbage.
pub fn decode_tunnel_frame(src: &mut BytesMut, accepted: &[Direction]) -> Option<TunnelFrame> {
    decode_tunnel_frame_counted(src, accepted, &mut DecodeStats::default())
}

pub(crate) fn decode_tunnel_frame_counted(
    src: &mut BytesMut,
    accepted: &[Direction],
    stats: &mut DecodeStats,
) -> Option<TunnelFrame> {
    let raw = scan::next_frame(src, TUNNEL_HEADER_SIZE, accepted, stats)?.freeze();
    let direction = Direction::from_byte(raw[2])?;
    Some(TunnelFrame {
        direction,
        id: raw[ID_OFFSET],
        code: raw[TUNNEL_HEADER_SIZE - 1],
        payload: raw.slice(TUNNEL_HEADER_SIZE..raw.len() - CHECKSUM_SIZE),
    })
}
