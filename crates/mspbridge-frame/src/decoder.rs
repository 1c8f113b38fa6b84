//! Incremental decoders fed from an unbounded byte stream.
//!
//! Each decoder owns an accumulator holding the unconsumed tail of earlier
//! `feed` calls. The accumulator only shrinks by bytes that were proven
//! consumed, either as a valid frame or as skipped garbage.

use bytes::BytesMut;

use crate::codec::{decode_frame_counted, Direction, Frame, DEVICE_DIRECTIONS};
use crate::tunnel::{decode_tunnel_frame_counted, TunnelFrame};

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Counters describing what a decoder has consumed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Valid frames emitted.
    pub frames: u64,
    /// Complete frames discarded for a checksum mismatch.
    pub checksum_errors: u64,
    /// Bytes discarded while resynchronizing, including corrupt frames.
    pub skipped_bytes: u64,
}

/// Device-side decoder.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    accepted: &'static [Direction],
    stats: DecodeStats,
}

impl FrameDecoder {
    /// Accept both request and response signatures, as seen on a serial link.
    pub fn new() -> Self {
        Self::with_directions(DEVICE_DIRECTIONS)
    }

    /// Accept only the given signature directions.
    pub fn with_directions(accepted: &'static [Direction]) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            accepted,
            stats: DecodeStats::default(),
        }
    }

    /// Append `data` and return every frame that is now complete, in order.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(data);
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    /// Pop one complete frame from the accumulator, if any.
    pub fn next_frame(&mut self) -> Option<Frame> {
        decode_frame_counted(&mut self.buf, self.accepted, &mut self.stats)
    }

    /// Bytes retained while waiting for the rest of a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Drop any retained bytes.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tunnel-side decoder.
#[derive(Debug)]
pub struct TunnelDecoder {
    buf: BytesMut,
    accepted: &'static [Direction],
    stats: DecodeStats,
}

impl TunnelDecoder {
    /// Decoder for the bridge end: accepts `'$M<'` requests.
    pub fn requests() -> Self {
        Self::with_directions(&[Direction::Request])
    }

    /// Decoder for the remote peer end: accepts `'$M>'` replies.
    pub fn replies() -> Self {
        Self::with_directions(&[Direction::Response])
    }

    pub fn with_directions(accepted: &'static [Direction]) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            accepted,
            stats: DecodeStats::default(),
        }
    }

    /// Append `data` and return every frame that is now complete, in order.
    pub fn feed(&mut self, data: &[u8]) -> Vec<TunnelFrame> {
        self.buf.extend_from_slice(data);
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    pub fn next_frame(&mut self) -> Option<TunnelFrame> {
        decode_tunnel_frame_counted(&mut self.buf, self.accepted, &mut self.stats)
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }
}
