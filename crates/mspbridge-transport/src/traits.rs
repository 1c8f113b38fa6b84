use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

/// A connected, bidirectional byte stream.
///
/// Implemented for anything that is `AsyncRead + AsyncWrite`, including
/// `TcpStream`, `SerialStream` and `tokio::io::DuplexStream`.
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> ByteStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Something that can (re)establish a stream on demand.
///
/// The bridge calls [`Connector::connect`] once at startup and again after
/// every disconnect.
pub trait Connector: Send + Sync + 'static {
    type Stream: ByteStream;

    /// Open a fresh stream.
    fn connect(&self) -> impl Future<Output = Result<Self::Stream>> + Send;

    /// Human-readable endpoint for logs.
    fn endpoint(&self) -> String;
}
