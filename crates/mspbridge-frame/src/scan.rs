//! Resynchronizing scanner shared by the device and tunnel layouts.

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::{checksum, Direction, PREAMBLE};
use crate::decoder::DecodeStats;

/// Offset of the length byte; identical in both layouts.
const LENGTH_OFFSET: usize = 3;

/// Outcome of examining the head of the accumulator.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// Leading bytes cannot start a frame.
    Skip(usize),
    /// A complete frame failed its checksum.
    Corrupt(usize),
    /// A complete, valid frame of this many bytes.
    Frame(usize),
    /// More bytes are needed before anything can be decided.
    Incomplete,
}

/// Examine the head of `buf`.
///
/// `header_len` counts every byte before the payload, so the code byte sits
/// at `header_len - 1` and a frame spans `header_len + length + 1` bytes.
/// A signature mismatch skips the examined signature bytes, but never a
/// `'$'` that could begin the next frame.
fn step(buf: &[u8], header_len: usize, accepted: &[Direction]) -> Step {
    let Some(&first) = buf.first() else {
        return Step::Incomplete;
    };
    if first != PREAMBLE[0] {
        return Step::Skip(1);
    }

    match buf.get(1) {
        None => return Step::Incomplete,
        Some(&b) if b == PREAMBLE[0] => return Step::Skip(1),
        Some(&b) if b != PREAMBLE[1] => return Step::Skip(2),
        Some(_) => {}
    }

    match buf.get(2) {
        None => return Step::Incomplete,
        Some(&b) if b == PREAMBLE[0] => return Step::Skip(2),
        Some(&b) if !accepted.iter().any(|d| d.as_byte() == b) => return Step::Skip(3),
        Some(_) => {}
    }

    let Some(&length) = buf.get(LENGTH_OFFSET) else {
        return Step::Incomplete;
    };
    let total = header_len + length as usize + 1;
    if buf.len() < total {
        return Step::Incomplete;
    }

    let code = buf[header_len - 1];
    let payload = &buf[header_len..total - 1];
    if checksum(length, code, payload) == buf[total - 1] {
        Step::Frame(total)
    } else {
        Step::Corrupt(total)
    }
}

/// Advance `src` past garbage and return the next complete frame's bytes.
///
/// Returns `None` once the buffer is empty or blocked by a partial frame;
/// the partial bytes stay in `src` for the next call.
pub(crate) fn next_frame(
    src: &mut BytesMut,
    header_len: usize,
    accepted: &[Direction],
    stats: &mut DecodeStats,
) -> Option<BytesMut> {
    loop {
        match step(src, header_len, accepted) {
            Step::Skip(n) => {
                trace!(skipped = n, "resync: no frame signature");
                src.advance(n);
                stats.skipped_bytes += n as u64;
            }
            Step::Corrupt(n) => {
                debug!(len = n, "resync: dropping frame with bad checksum");
                src.advance(n);
                stats.skipped_bytes += n as u64;
                stats.checksum_errors += 1;
            }
            Step::Frame(n) => {
                stats.frames += 1;
                return Some(src.split_to(n));
            }
            Step::Incomplete => return None,
        }
    }
}
