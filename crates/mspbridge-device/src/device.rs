//! The device task and its handle.
//!
//! One tokio task owns the serial stream. Callers submit requests over an
//! unbounded channel and wait on a oneshot for the [`Reply`]. The task's
//! event loop selects over new submissions, decoded frames and the reply
//! deadline of the in-flight request.

use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use mspbridge_frame::{encode_request, FrameError, MspCodec, MAX_PAYLOAD};
use mspbridge_transport::ByteStream;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, PendingRequest, Resolved};
use crate::error::{DeviceError, Result};
use crate::reply::{AbandonReason, Reply};

/// Default per-request reply wait.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(1000);

/// Longest reply wait honoured; longer waits are clamped to it.
pub const MAX_WAIT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Deadline for a reply to a request written now.
pub fn reply_deadline(wait: Duration) -> Instant {
    Instant::now() + wait.min(MAX_WAIT)
}

/// Device task configuration.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Wait used by [`Device::request`].
    pub default_wait: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            default_wait: DEFAULT_WAIT,
        }
    }
}

type ReplyTx = oneshot::Sender<Reply>;

enum Message {
    Submit(PendingRequest<ReplyTx>),
    Close,
}

/// Cloneable handle to a running device task.
#[derive(Debug, Clone)]
pub struct Device {
    tx: mpsc::UnboundedSender<Message>,
    default_wait: Duration,
}

impl Device {
    /// Start the device task on `stream`.
    ///
    /// The task ends with `Ok(())` after [`close`](Self::close) or once every
    /// handle is dropped, and with [`DeviceError::Disconnected`] when the
    /// stream reaches EOF.
    pub fn spawn<S: ByteStream>(stream: S, config: DeviceConfig) -> (Self, JoinHandle<Result<()>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(stream, rx));
        let device = Self {
            tx,
            default_wait: config.default_wait,
        };
        (device, task)
    }

    /// Send `code` with `payload` and wait up to `wait` for its reply.
    ///
    /// The wait starts once the request has been written, not when it is
    /// queued.
    pub async fn send(&self, code: u8, payload: impl Into<Bytes>, wait: Duration) -> Result<Reply> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            }
            .into());
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Message::Submit(PendingRequest::new(reply_tx, code, payload, wait)))
            .map_err(|_| DeviceError::NotConnected)?;

        reply_rx.await.map_err(|_| DeviceError::Disconnected)
    }

    /// [`send`](Self::send) with the configured default wait.
    pub async fn request(&self, code: u8, payload: impl Into<Bytes>) -> Result<Reply> {
        self.send(code, payload, self.default_wait).await
    }

    /// Ask the task to stop. Unresolved requests fail with
    /// [`DeviceError::Disconnected`].
    pub fn close(&self) {
        let _ = self.tx.send(Message::Close);
    }

    /// Whether the task is still accepting requests.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn default_wait(&self) -> Duration {
        self.default_wait
    }
}

async fn run<S: ByteStream>(stream: S, mut rx: mpsc::UnboundedReceiver<Message>) -> Result<()> {
    let (reader, mut writer) = tokio::io::split(stream);
    let mut frames = FramedRead::new(reader, MspCodec::new());
    let mut dispatcher: Dispatcher<ReplyTx> = Dispatcher::new();
    let mut deadline: Option<Instant> = None;

    let result = loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(Message::Submit(req)) => {
                    if dispatcher.enqueue(req) {
                        deadline = dispatch(&mut dispatcher, &mut writer).await;
                    }
                }
                Some(Message::Close) | None => {
                    debug!("device closed by caller");
                    break Ok(());
                }
            },
            frame = frames.next() => match frame {
                Some(Ok(frame)) => match dispatcher.resolve(frame.code) {
                    Some(Resolved::Matched(req)) => {
                        let _ = req.tag.send(Reply::Payload(frame.payload));
                        deadline = dispatch(&mut dispatcher, &mut writer).await;
                    }
                    Some(Resolved::Mismatched(req)) => {
                        let reason = AbandonReason::Mismatch { code: frame.code };
                        let _ = req.tag.send(Reply::Abandoned(reason));
                        deadline = dispatch(&mut dispatcher, &mut writer).await;
                    }
                    None => debug!(code = frame.code, "ignoring unsolicited frame"),
                },
                Some(Err(e)) => {
                    warn!(error = %e, "serial read failed");
                    break Err(e.into());
                }
                None => {
                    info!("serial stream closed");
                    break Err(DeviceError::Disconnected);
                }
            },
            () = wait_until(deadline) => {
                if let Some(req) = dispatcher.expire() {
                    let _ = req.tag.send(Reply::Abandoned(AbandonReason::Timeout));
                }
                deadline = dispatch(&mut dispatcher, &mut writer).await;
            }
        }
    };

    let dropped = dispatcher.drain().len();
    if dropped > 0 {
        debug!(dropped, "dropping unresolved requests");
    }
    result
}

/// Write the next live request and return its reply deadline.
///
/// Requests whose caller has gone away are skipped without touching the
/// device. A failed write abandons that request and moves on.
async fn dispatch<W: AsyncWrite + Unpin>(
    dispatcher: &mut Dispatcher<ReplyTx>,
    writer: &mut W,
) -> Option<Instant> {
    loop {
        let req = dispatcher.dispatch_next()?;
        if req.tag.is_closed() {
            debug!(code = req.code, "skipping request with no waiting caller");
            dispatcher.expire();
            continue;
        }

        let (code, payload, wait) = (req.code, req.payload.clone(), req.wait);
        match write_request(writer, code, &payload).await {
            Ok(()) => return Some(reply_deadline(wait)),
            Err(e) => {
                warn!(code, error = %e, "failed to write request");
                if let Some(req) = dispatcher.expire() {
                    let _ = req.tag.send(Reply::Abandoned(AbandonReason::WriteFailed));
                }
            }
        }
    }
}

async fn write_request<W: AsyncWrite + Unpin>(writer: &mut W, code: u8, payload: &[u8]) -> Result<()> {
    let wire = encode_request(code, payload)?;
    writer.write_all(&wire).await?;
    writer.flush().await?;
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
