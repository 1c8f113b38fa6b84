use bytes::{BufMut, Bytes, BytesMut};

use crate::decoder::DecodeStats;
use crate::error::{FrameError, Result};
use crate::scan;

/// Frame signature: `'$' 'M'`.
pub const PREAMBLE: [u8; 2] = *b"$M";

/// Device frame header: preamble (2) + direction (1) + length (1) + code (1).
pub const HEADER_SIZE: usize = 5;

/// Trailing XOR checksum.
pub const CHECKSUM_SIZE: usize = 1;

/// The length field is a single byte.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Directions accepted from a serial device.
///
/// Requests echo the `'$M<'` signature; flight controllers answer with `'$M>'`.
pub const DEVICE_DIRECTIONS: &[Direction] = &[Direction::Request, Direction::Response];

/// Third signature byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Toward the flight controller (`'<'`).
    Request = b'<',
    /// From the flight controller (`'>'`).
    Response = b'>',
    /// Firmware could not process the request (`'!'`).
    Error = b'!',
}

impl Direction {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'<' => Some(Self::Request),
            b'>' => Some(Self::Response),
            b'!' => Some(Self::Error),
            _ => None,
        }
    }
}

/// A checksum-verified device frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Signature direction the frame carried.
    pub direction: Direction,
    /// MSP operation identifier.
    pub code: u8,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(direction: Direction, code: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            direction,
            code,
            payload: payload.into(),
        }
    }

    /// Create a request frame (`'$M<'`).
    pub fn request(code: u8, payload: impl Into<Bytes>) -> Self {
        Self::new(Direction::Request, code, payload)
    }

    /// The total wire size of this frame (header + payload + checksum).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }
}

/// XOR of the length byte, the code byte and every payload byte.
pub fn checksum(length: u8, code: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(length ^ code, |acc, b| acc ^ b)
}

/// Encode a device frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬─────┬────────┬──────┬───────────────┬──────────┐
/// │ '$' 'M'  │ dir │ length │ code │ payload       │ checksum │
/// │ (2B)     │ (1) │ (1)    │ (1)  │ (length B)    │ (1)      │
/// └──────────┴─────┴────────┴──────┴───────────────┴──────────┘
/// ```
pub fn encode_frame(
    direction: Direction,
    code: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let length = payload_length(payload)?;
    dst.reserve(HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
    dst.put_slice(&PREAMBLE);
    dst.put_u8(direction.as_byte());
    dst.put_u8(length);
    dst.put_u8(code);
    dst.put_slice(payload);
    dst.put_u8(checksum(length, code, payload));
    Ok(())
}

/// Encode a `'$M<'` request for the device.
pub fn encode_request(code: u8, payload: &[u8]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
    encode_frame(Direction::Request, code, payload, &mut dst)?;
    Ok(dst.freeze())
}

/// Decode the next device frame from a buffer.
///
/// Garbage and frames with a bad checksum are consumed and discarded.
/// Returns `None` once the buffer holds no complete frame; any partial
/// frame is left in place for the next call.
pub fn decode_frame(src: &mut BytesMut, accepted: &[Direction]) -> Option<Frame> {
    decode_frame_counted(src, accepted, &mut DecodeStats::default())
}

pub(crate) fn decode_frame_counted(
    src: &mut BytesMut,
    accepted: &[Direction],
    stats: &mut DecodeStats,
) -> Option<Frame> {
    let raw = scan::next_frame(src, HEADER_SIZE, accepted, stats)?.freeze();
    let direction = Direction::from_byte(raw[2])?;
    let code = raw[HEADER_SIZE - 1];
    let payload = raw.slice(HEADER_SIZE..raw.len() - CHECKSUM_SIZE);
    Some(Frame {
        direction,
        code,
        payload,
    })
}

pub(crate) fn payload_length(payload: &[u8]) -> Result<u8> {
    u8::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: MAX_PAYLOAD,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_request_matches_reference_bytes() {
        let wire = encode_request(101, &[]).unwrap();
        assert_eq!(wire.as_ref(), &[0x24, 0x4D, 0x3C, 0x00, 0x65, 0x65]);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = [0x01, 0xFF, 0x24, 0x4D];
        encode_frame(Direction::Request, 200, &payload, &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_SIZE + payload.len() + CHECKSUM_SIZE);

        let frame = decode_frame(&mut buf, DEVICE_DIRECTIONS).unwrap();
        assert_eq!(frame.direction, Direction::Request);
        assert_eq!(frame.code, 200);
        assert_eq!(frame.payload.as_ref(), &payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn roundtrip_holds_across_payload_lengths() {
        for len in [0usize, 1, 2, 31, 128, 254, 255] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let mut buf = BytesMut::new();
            encode_frame(Direction::Response, len as u8, &payload, &mut buf).unwrap();
            let frame = decode_frame(&mut buf, DEVICE_DIRECTIONS).unwrap();
            assert_eq!(frame.code, len as u8);
            assert_eq!(frame.payload.as_ref(), payload.as_slice());
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_payload_too_large() {
        let mut buf = BytesMut::new();
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let result = encode_frame(Direction::Request, 1, &payload, &mut buf);
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge { size: 256, max: 255 })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(Direction::Request, 1, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        assert!(decode_frame(&mut buf, DEVICE_DIRECTIONS).is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(Direction::Request, 1, b"first", &mut buf).unwrap();
        encode_frame(Direction::Response, 2, b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEVICE_DIRECTIONS).unwrap();
        assert_eq!(f1.code, 1);
        assert_eq!(f1.payload.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, DEVICE_DIRECTIONS).unwrap();
        assert_eq!(f2.code, 2);
        assert_eq!(f2.direction, Direction::Response);
        assert_eq!(f2.payload.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn error_direction_is_skipped_by_device_decoder() {
        let mut buf = BytesMut::new();
        encode_frame(Direction::Error, 9, &[], &mut buf).unwrap();
        encode_frame(Direction::Response, 101, &[1], &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEVICE_DIRECTIONS).unwrap();
        assert_eq!(frame.code, 101);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::request(1, Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), HEADER_SIZE + 4 + CHECKSUM_SIZE);
    }

    #[test]
    fn checksum_is_xor_of_length_code_and_payload() {
        assert_eq!(checksum(0, 101, &[]), 0x65);
        assert_eq!(checksum(2, 0x10, &[0x01, 0x02]), 2 ^ 0x10 ^ 0x01 ^ 0x02);
    }
}
