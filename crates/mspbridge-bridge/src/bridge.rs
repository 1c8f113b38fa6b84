//! The bridge core.
//!
//! One task owns the serial stream, the dispatcher and the reply deadline.
//! It selects over link events, decoded serial frames and the deadline, so
//! no state is shared and nothing needs a lock.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use mspbridge_device::{reply_deadline, Dispatcher, PendingRequest, Resolved};
use mspbridge_frame::{encode_request, encode_tunnel_frame, Direction, Frame, MspCodec, TunnelDecoder};
use mspbridge_transport::{ByteStream, Connector};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

use crate::config::{BridgeConfig, BridgeMode, Correlation};
use crate::error::{BridgeError, Result};
use crate::link::{Link, LinkEvent, Outbound};

const SERIAL_READ_CAPACITY: usize = 1024;

/// A serial device bridged to a TCP endpoint.
pub struct Bridge<S, C> {
    config: BridgeConfig,
    serial: S,
    connector: C,
}

impl<S: ByteStream, C: Connector> Bridge<S, C> {
    pub fn new(config: BridgeConfig, serial: S, connector: C) -> Self {
        Self {
            config,
            serial,
            connector,
        }
    }

    /// Run until the serial stream ends or fails.
    ///
    /// TCP failures never end the run; the link reconnects instead.
    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            serial,
            connector,
        } = self;
        let mut link = Link::spawn(connector, config.reconnect);

        match config.mode {
            BridgeMode::Multiplexed => {
                info!(correlation = ?config.correlation, "bridge running in multiplexed mode");
                Multiplexer::new(config.reply_timeout, config.correlation)
                    .run(serial, &mut link)
                    .await
            }
            BridgeMode::Passthrough { handshake } => {
                info!("bridge running in passthrough mode");
                run_passthrough(serial, &mut link, handshake).await
            }
        }
    }
}

#[cfg(feature = "serial")]
impl<C: Connector> Bridge<mspbridge_transport::SerialStream, C> {
    /// Open the serial port described by `serial` and bridge it.
    pub fn open(
        config: BridgeConfig,
        serial: &mspbridge_transport::SerialConfig,
        connector: C,
    ) -> Result<Self> {
        Ok(Self::new(config, serial.open()?, connector))
    }
}

/// Where a tunnel request came from: its connection and its tunnel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Origin {
    epoch: u64,
    id: u8,
}

/// Multiplexed-mode state.
struct Multiplexer {
    reply_timeout: Duration,
    correlation: Correlation,
    dispatcher: Dispatcher<Origin>,
    tunnel: TunnelDecoder,
    deadline: Option<Instant>,
    /// Epoch of the live connection, if any.
    epoch: Option<u64>,
}

impl Multiplexer {
    fn new(reply_timeout: Duration, correlation: Correlation) -> Self {
        Self {
            reply_timeout,
            correlation,
            dispatcher: Dispatcher::new(),
            tunnel: TunnelDecoder::requests(),
            deadline: None,
            epoch: None,
        }
    }

    async fn run<S: ByteStream>(mut self, serial: S, link: &mut Link) -> Result<()> {
        let (reader, mut writer) = tokio::io::split(serial);
        let mut replies = FramedRead::new(reader, MspCodec::new());

        loop {
            tokio::select! {
                event = link.events.recv() => match event {
                    Some(LinkEvent::Connected { epoch }) => {
                        self.tunnel.reset();
                        self.epoch = Some(epoch);
                    }
                    Some(LinkEvent::Data(chunk)) => {
                        let Some(epoch) = self.epoch else {
                            debug!(len = chunk.len(), "data without a live connection; dropping");
                            continue;
                        };
                        for frame in self.tunnel.feed(&chunk) {
                            debug!(id = frame.id, code = frame.code, "tunnel request");
                            let origin = Origin { epoch, id: frame.id };
                            let req = PendingRequest::new(origin, frame.code, frame.payload, self.reply_timeout);
                            if self.dispatcher.enqueue(req) {
                                self.dispatch(&mut writer).await?;
                            }
                        }
                    }
                    Some(LinkEvent::Disconnected) => {
                        self.epoch = None;
                        let dropped = self.dispatcher.clear_queued();
                        if !dropped.is_empty() {
                            debug!(count = dropped.len(), "dropping requests from closed connection");
                        }
                    }
                    None => return Err(BridgeError::LinkClosed),
                },
                frame = replies.next() => match frame {
                    Some(Ok(frame)) => {
                        if let Some(origin) = self.settle(&frame) {
                            self.forward(link, origin, &frame)?;
                            self.dispatch(&mut writer).await?;
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(BridgeError::SerialClosed),
                },
                () = wait_until(self.deadline) => {
                    if let Some(req) = self.dispatcher.expire() {
                        debug!(id = req.tag.id, code = req.code, "no reply from device");
                    }
                    self.dispatch(&mut writer).await?;
                }
            }
        }
    }

    /// Match a serial reply to the in-flight request and return its origin.
    fn settle(&mut self, frame: &Frame) -> Option<Origin> {
        if self.correlation == Correlation::StrictCode && !self.dispatcher.current_matches(frame.code) {
            debug!(code = frame.code, "dropping reply that does not match in-flight request");
            return None;
        }
        match self.dispatcher.resolve(frame.code) {
            Some(Resolved::Matched(req)) => Some(req.tag),
            Some(Resolved::Mismatched(req)) => {
                debug!(id = req.tag.id, expected = req.code, got = frame.code, "forwarding reply by position");
                Some(req.tag)
            }
            None => {
                debug!(code = frame.code, "ignoring unsolicited reply");
                None
            }
        }
    }

    /// Send a reply back on the connection its request arrived on.
    ///
    /// Replies for a connection that has since closed are dropped.
    fn forward(&self, link: &Link, origin: Origin, frame: &Frame) -> Result<()> {
        if self.epoch != Some(origin.epoch) {
            debug!(id = origin.id, code = frame.code, epoch = origin.epoch, "connection gone; dropping reply");
            return Ok(());
        }
        let mut buf = BytesMut::with_capacity(frame.wire_size() + 1);
        encode_tunnel_frame(Direction::Response, origin.id, frame.code, &frame.payload, &mut buf)?;
        let _ = link.outbound.send(Outbound {
            epoch: origin.epoch,
            data: buf.freeze(),
        });
        Ok(())
    }

    /// Write the next queued request, if any, and arm its deadline.
    async fn dispatch<W: AsyncWrite + Unpin>(&mut self, writer: &mut W) -> Result<()> {
        self.deadline = None;
        let Some(req) = self.dispatcher.dispatch_next() else {
            return Ok(());
        };
        let wait = req.wait;
        let wire = encode_request(req.code, &req.payload)?;
        writer.write_all(&wire).await?;
        writer.flush().await?;
        self.deadline = Some(reply_deadline(wait));
        Ok(())
    }
}

async fn run_passthrough<S: ByteStream>(
    serial: S,
    link: &mut Link,
    handshake: Option<Bytes>,
) -> Result<()> {
    let (mut reader, mut writer) = tokio::io::split(serial);
    let mut buf = BytesMut::with_capacity(SERIAL_READ_CAPACITY);
    let mut epoch = None;

    loop {
        tokio::select! {
            event = link.events.recv() => match event {
                Some(LinkEvent::Connected { epoch: current }) => {
                    epoch = Some(current);
                    if let Some(handshake) = &handshake {
                        let _ = link.outbound.send(Outbound {
                            epoch: current,
                            data: handshake.clone(),
                        });
                    }
                }
                Some(LinkEvent::Data(chunk)) => {
                    writer.write_all(&chunk).await?;
                    writer.flush().await?;
                }
                Some(LinkEvent::Disconnected) => epoch = None,
                None => return Err(BridgeError::LinkClosed),
            },
            read = reader.read_buf(&mut buf) => {
                if read? == 0 {
                    return Err(BridgeError::SerialClosed);
                }
                let chunk = buf.split().freeze();
                buf.reserve(SERIAL_READ_CAPACITY);
                match epoch {
                    Some(epoch) => {
                        let _ = link.outbound.send(Outbound { epoch, data: chunk });
                    }
                    None => debug!(len = chunk.len(), "tunnel down; dropping serial bytes"),
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
