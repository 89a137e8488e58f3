// Transport seam for the duplex channel. The channel never touches a
// socket directly; it talks to a `Transport` and asks a `Dial` for a
// fresh one on every (re)connection attempt, which is what makes the
// reconnect machinery testable with scripted fakes.
//
// The wire format is JSON lines: one serialized event per newline-
// terminated frame.

use std::future::Future;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// One live duplex connection.
pub trait Transport: Send + 'static {
    /// Send one frame (without the trailing newline).
    fn send(&mut self, frame: &str) -> impl Future<Output = Result<()>> + Send;

    /// Receive the next frame. `Ok(None)` means the peer closed cleanly.
    fn recv(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Factory producing a fresh [`Transport`] per connection attempt.
pub trait Dial: Send + 'static {
    type Conn: Transport;

    fn dial(&mut self) -> impl Future<Output = Result<Self::Conn>> + Send;
}

/// JSON-lines transport over TCP.
pub struct TcpTransport {
    writer: OwnedWriteHalf,
    reader: Lines<BufReader<OwnedReadHalf>>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        let (read, writer) = stream.into_split();
        let reader = BufReader::new(read).lines();
        Self { writer, reader }
    }
}

impl Transport for TcpTransport {
    async fn send(&mut self, frame: &str) -> Result<()> {
        self.writer
            .write_all(frame.as_bytes())
            .await
            .context("failed to write frame")?;
        self.writer.write_all(b"\n").await.context("failed to write frame")?;
        self.writer.flush().await.context("failed to flush frame")?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        self.reader.next_line().await.context("failed to read frame")
    }
}

/// Dials a fixed address, one fresh connection per attempt.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    addr: String,
}

impl TcpDialer {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Dial for TcpDialer {
    type Conn = TcpTransport;

    async fn dial(&mut self) -> Result<TcpTransport> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .with_context(|| format!("failed to connect to {}", self.addr))?;
        Ok(TcpTransport::new(stream))
    }
}
