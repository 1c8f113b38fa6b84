//! `tokio_util::codec` adapters for use with `FramedRead` / `FramedWrite`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame_counted, encode_frame, Direction, Frame, DEVICE_DIRECTIONS};
use crate::decoder::DecodeStats;
use crate::error::FrameError;
use crate::tunnel::{decode_tunnel_frame_counted, encode_tunnel_frame, TunnelFrame};

/// Device-side codec.
///
/// Same scanning rules as [`crate::FrameDecoder`]; the accumulator is the
/// `Framed` read buffer.
#[derive(Debug)]
pub struct MspCodec {
    accepted: &'static [Direction],
    stats: DecodeStats,
}

impl MspCodec {
    /// Accept request and response signatures.
    pub fn new() -> Self {
        Self::with_directions(DEVICE_DIRECTIONS)
    }

    pub fn with_directions(accepted: &'static [Direction]) -> Self {
        Self {
            accepted,
            stats: DecodeStats::default(),
        }
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }
}

impl Default for MspCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MspCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(decode_frame_counted(src, self.accepted, &mut self.stats))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = self.decode(src)?;
        if frame.is_none() {
            // A truncated trailing frame can never complete.
            src.clear();
        }
        Ok(frame)
    }
}

impl Encoder<Frame> for MspCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(item.direction, item.code, &item.payload, dst)
    }
}

/// Tunnel-side codec.
#[derive(Debug)]
pub struct TunnelCodec {
    accepted: &'static [Direction],
    stats: DecodeStats,
}

impl TunnelCodec {
    /// Bridge end: decodes `'$M<'` requests.
    pub fn requests() -> Self {
        Self {
            accepted: &[Direction::Request],
            stats: DecodeStats::default(),
        }
    }

    /// Peer end: decodes `'$M>'` replies.
    pub fn replies() -> Self {
        Self {
            accepted: &[Direction::Response],
            stats: DecodeStats::default(),
        }
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }
}

impl Decoder for TunnelCodec {
    type Item = TunnelFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(decode_tunnel_frame_counted(src, self.accepted, &mut self.stats))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = self.decode(src)?;
        if frame.is_none() {
            src.clear();
        }
        Ok(frame)
    }
}

impl Encoder<TunnelFrame> for TunnelCodec {
    type Error = FrameError;

    fn encode(&mut self, item: TunnelFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_tunnel_frame(item.direction, item.id, item.code, &item.payload, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::codec::encode_request;

    #[tokio::test]
    async fn framed_read_resyncs_across_chunks() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = FramedRead::new(rx, MspCodec::new());

        let wire = encode_request(108, &[1, 2, 3, 4, 5, 6]).unwrap();
        tx.write_all(&[0xDE, 0xAD]).await.unwrap();
        tx.write_all(&wire[..3]).await.unwrap();
        tx.write_all(&wire[3..]).await.unwrap();
        drop(tx);

        let frame = reader.next().await.unwrap().unwrap();
        assert_eq!(frame.code, 108);
        assert!(reader.next().await.is_none());
        assert_eq!(reader.decoder().stats().skipped_bytes, 2);
    }

    #[tokio::test]
    async fn truncated_tail_ends_stream_cleanly() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = FramedRead::new(rx, MspCodec::new());

        let wire = encode_request(101, &[7, 7]).unwrap();
        tx.write_all(&wire[..4]).await.unwrap();
        drop(tx);

        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn tunnel_codec_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(256);
        let mut writer = FramedWrite::new(client, TunnelCodec::requests());
        let mut reader = FramedRead::new(server, TunnelCodec::requests());

        writer
            .send(TunnelFrame::request(1, 108, Vec::new()))
            .await
            .unwrap();
        writer
            .send(TunnelFrame::request(2, 101, vec![0xAB]))
            .await
            .unwrap();

        let first = reader.next().await.unwrap().unwrap();
        let second = reader.next().await.unwrap().unwrap();
        assert_eq!((first.id, first.code), (1, 108));
        assert_eq!((second.id, second.code), (2, 101));
        assert_eq!(second.payload.as_ref(), &[0xAB]);
    }
}
