//! The TCP side of the bridge.
//!
//! The link task owns the current connection. It reports connection state
//! and inbound chunks to the bridge core, writes outbound chunks, and
//! reconnects whenever the connection closes or a connect attempt fails.
//! Each connection gets a new epoch, and outbound chunks tagged with an
//! older epoch are dropped.

use bytes::{Bytes, BytesMut};
use mspbridge_transport::Connector;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::config::ReconnectPolicy;

const READ_BUFFER_CAPACITY: usize = 4096;

/// Connection state and data reported to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkEvent {
    Connected { epoch: u64 },
    Data(Bytes),
    Disconnected,
}

/// A chunk to write on the connection identified by `epoch`.
#[derive(Debug)]
pub(crate) struct Outbound {
    pub epoch: u64,
    pub data: Bytes,
}

pub(crate) struct Link {
    pub events: mpsc::UnboundedReceiver<LinkEvent>,
    pub outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

impl Link {
    pub(crate) fn spawn<C: Connector>(connector: C, policy: ReconnectPolicy) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(connector, policy, events_tx, outbound_rx));
        Self {
            events,
            outbound,
            task,
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<C: Connector>(
    connector: C,
    policy: ReconnectPolicy,
    events: mpsc::UnboundedSender<LinkEvent>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let mut backoff = Backoff::new(policy);
    let mut epoch = 0u64;

    loop {
        let stream = loop {
            match connector.connect().await {
                Ok(stream) => break stream,
                Err(e) => {
                    warn!(addr = %connector.endpoint(), error = %e, "tunnel connect failed");
                    match backoff.next_delay() {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => tokio::task::yield_now().await,
                    }
                    if events.is_closed() {
                        return;
                    }
                }
            }
        };
        backoff.reset();
        epoch += 1;
        info!(addr = %connector.endpoint(), epoch, "tunnel connected");
        if events.send(LinkEvent::Connected { epoch }).is_err() {
            return;
        }

        let (mut reader, mut writer) = tokio::io::split(stream);
        let mut buf = BytesMut::with_capacity(READ_BUFFER_CAPACITY);
        loop {
            tokio::select! {
                read = reader.read_buf(&mut buf) => match read {
                    Ok(0) => {
                        info!(epoch, "tunnel closed by peer");
                        break;
                    }
                    Ok(_) => {
                        if events.send(LinkEvent::Data(buf.split().freeze())).is_err() {
                            return;
                        }
                        buf.reserve(READ_BUFFER_CAPACITY);
                    }
                    Err(e) => {
                        warn!(epoch, error = %e, "tunnel read failed");
                        break;
                    }
                },
                out = outbound.recv() => match out {
                    Some(out) if out.epoch != epoch => {
                        debug!(stale = out.epoch, epoch, len = out.data.len(), "dropping chunk for old connection");
                    }
                    Some(out) => {
                        let written = async {
                            writer.write_all(&out.data).await?;
                            writer.flush().await
                        };
                        if let Err(e) = written.await {
                            warn!(epoch, error = %e, "tunnel write failed");
                            break;
                        }
                    }
                    None => return,
                },
            }
        }

        if events.send(LinkEvent::Disconnected).is_err() {
            return;
        }
        info!(addr = %connector.endpoint(), "reconnecting");
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use mspbridge_transport::{Result as TransportResult, TransportError};
    use tokio::io::DuplexStream;
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    use super::*;

    fn refused() -> TransportError {
        TransportError::Connect {
            addr: "test".into(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "no stream"),
        }
    }

    struct Streams(Mutex<mpsc::UnboundedReceiver<DuplexStream>>);

    impl Connector for Streams {
        type Stream = DuplexStream;

        async fn connect(&self) -> TransportResult<DuplexStream> {
            self.0.lock().await.recv().await.ok_or_else(refused)
        }

        fn endpoint(&self) -> String {
            "test".into()
        }
    }

    /// Refuses the first `failures` attempts, then hands out one stream.
    struct Flaky {
        failures: AtomicUsize,
        stream: std::sync::Mutex<Option<DuplexStream>>,
        attempts: Arc<std::sync::Mutex<Vec<Instant>>>,
    }

    impl Flaky {
        fn new(failures: usize, stream: DuplexStream) -> (Self, Arc<std::sync::Mutex<Vec<Instant>>>) {
            let attempts = Arc::new(std::sync::Mutex::new(Vec::new()));
            let flaky = Self {
                failures: AtomicUsize::new(failures),
                stream: std::sync::Mutex::new(Some(stream)),
                attempts: Arc::clone(&attempts),
            };
            (flaky, attempts)
        }
    }

    impl Connector for Flaky {
        type Stream = DuplexStream;

        async fn connect(&self) -> TransportResult<DuplexStream> {
            self.attempts.lock().unwrap().push(Instant::now());
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(refused());
            }
            let stream = self.stream.lock().unwrap().take();
            stream.ok_or_else(refused)
        }

        fn endpoint(&self) -> String {
            "flaky".into()
        }
    }

    #[tokio::test]
    async fn failed_connects_are_retried_until_one_succeeds() {
        let (near, _far) = tokio::io::duplex(64);
        let (connector, attempts) = Flaky::new(3, near);
        let mut link = Link::spawn(connector, ReconnectPolicy::Immediate);

        assert_eq!(link.events.recv().await, Some(LinkEvent::Connected { epoch: 1 }));
        assert_eq!(attempts.lock().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connects_back_off_between_attempts() {
        let (near, _far) = tokio::io::duplex(64);
        let (connector, attempts) = Flaky::new(3, near);
        let mut link = Link::spawn(
            connector,
            ReconnectPolicy::Backoff {
                initial: Duration::from_millis(100),
                max: Duration::from_millis(250),
            },
        );

        assert_eq!(link.events.recv().await, Some(LinkEvent::Connected { epoch: 1 }));
        let attempts = attempts.lock().unwrap().clone();
        assert_eq!(attempts.len(), 4);

        let expected = [100u64, 200, 250].map(Duration::from_millis);
        for (pair, want) in attempts.windows(2).zip(expected) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= want && gap < want + Duration::from_millis(5),
                "expected about {want:?} between attempts, got {gap:?}"
            );
        }
    }

    #[tokio::test]
    async fn stale_outbound_chunks_are_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut link = Link::spawn(Streams(Mutex::new(rx)), ReconnectPolicy::Immediate);

        let (near, far) = tokio::io::duplex(256);
        tx.send(near).unwrap();
        assert_eq!(link.events.recv().await, Some(LinkEvent::Connected { epoch: 1 }));
        drop(far);
        assert_eq!(link.events.recv().await, Some(LinkEvent::Disconnected));

        let (near, mut far) = tokio::io::duplex(256);
        tx.send(near).unwrap();
        assert_eq!(link.events.recv().await, Some(LinkEvent::Connected { epoch: 2 }));

        link.outbound
            .send(Outbound {
                epoch: 1,
                data: Bytes::from_static(b"old"),
            })
            .unwrap();
        link.outbound
            .send(Outbound {
                epoch: 2,
                data: Bytes::from_static(b"new"),
            })
            .unwrap();

        let mut got = [0u8; 3];
        far.read_exact(&mut got).await.unwrap();
        assert_eq!(&got, b"new");
    }

    #[tokio::test]
    async fn inbound_bytes_become_data_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut link = Link::spawn(Streams(Mutex::new(rx)), ReconnectPolicy::Immediate);

        let (near, mut far) = tokio::io::duplex(256);
        tx.send(near).unwrap();
        assert_eq!(link.events.recv().await, Some(LinkEvent::Connected { epoch: 1 }));

        far.write_all(b"$M<").await.unwrap();
        assert_eq!(
            link.events.recv().await,
            Some(LinkEvent::Data(Bytes::from_static(b"$M<")))
        );
    }
}
