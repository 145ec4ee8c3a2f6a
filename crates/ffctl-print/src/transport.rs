// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Byte-stream transport to a single printer.
//
// A `Connection` owns one duplex stream for the length of a command sequence.
// The protocol is half-duplex per exchange (write a request, read its reply),
// so every primitive here runs to completion before the next one starts and
// nothing is shared between call sites.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

use ffctl_core::error::{FfError, Result};
use ffctl_core::types::HostPort;

/// Longest reply line accepted before the peer is considered to be
/// streaming garbage.
pub const MAX_LINE_LEN: usize = 4096;

/// An open, exclusively owned byte stream to one printer.
pub struct Connection<S = TcpStream> {
    stream: BufReader<S>,
    peer: String,
    timeout: Option<Duration>,
}

impl Connection<TcpStream> {
    /// Resolve `addr` and open a TCP connection to it.
    ///
    /// `timeout` bounds the connect itself and every later read and write.
    /// `None` blocks indefinitely.
    pub async fn connect(addr: &HostPort, timeout: Option<Duration>) -> Result<Self> {
        let target = addr.socket_addr_string();
        debug!(addr = %target, "connecting");

        let connect = TcpStream::connect(target.as_str());
        let stream = match timeout {
            Some(limit) => tokio::time::timeout(limit, connect).await.map_err(|_| {
                FfError::Connection {
                    addr: target.clone(),
                    reason: format!("connect timed out after {}s", limit.as_secs_f32()),
                }
            })?,
            None => connect.await,
        }
        .map_err(|e| FfError::Connection {
            addr: target.clone(),
            reason: e.to_string(),
        })?;

        // Commands are tiny; don't let Nagle hold them back.
        stream.set_nodelay(true)?;

        info!(addr = %target, "connected to printer");
        Ok(Self::new(stream, target).with_timeout(timeout))
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-open stream. `peer` is only used for diagnostics.
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream: BufReader::new(stream),
            peer: peer.into(),
            timeout: None,
        }
    }

    /// Apply a deadline to every subsequent read and write.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Read up to and including the next `\n`.
    ///
    /// The returned line keeps its terminator. End of stream before any byte
    /// of the line is `StreamClosed`. End of stream partway through a line,
    /// or a non-ASCII byte, is a protocol error.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let mut limited = (&mut self.stream).take(MAX_LINE_LEN as u64);
        let n = with_deadline(
            self.timeout,
            "reading a reply line",
            limited.read_until(b'\n', &mut buf),
        )
        .await?;

        if buf.last() != Some(&b'\n') {
            if n == MAX_LINE_LEN {
                return Err(FfError::Protocol(format!(
                    "reply line exceeds {MAX_LINE_LEN} bytes"
                )));
            }
            if buf.is_empty() {
                return Err(FfError::StreamClosed("reading a reply line".into()));
            }
            return Err(FfError::Protocol(format!(
                "stream closed mid-line after {:?}",
                String::from_utf8_lossy(&buf)
            )));
        }
        if !buf.is_ascii() {
            return Err(FfError::Protocol(format!(
                "non-ASCII bytes in reply line: {:?}",
                String::from_utf8_lossy(&buf)
            )));
        }

        String::from_utf8(buf).map_err(|e| FfError::Protocol(e.to_string()))
    }

    /// Read exactly `n` bytes.
    pub async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        with_deadline(
            self.timeout,
            "reading binary data",
            self.stream.read_exact(&mut buf),
        )
        .await?;
        Ok(buf)
    }

    /// Write every byte and flush. There is no partial success.
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        with_deadline(self.timeout, "writing", self.stream.write_all(bytes)).await?;
        self.flush().await
    }

    pub async fn flush(&mut self) -> Result<()> {
        with_deadline(self.timeout, "flushing", self.stream.flush()).await
    }

    /// Force whatever is written next into a separate network packet.
    ///
    /// A flush alone is not enough: the kernel may still coalesce the
    /// flushed bytes with a small write that follows quickly, even with
    /// `TCP_NODELAY`. Flushing, waiting `delay`, then flushing again lets the
    /// pending segment leave before the next write is queued.
    pub async fn packet_boundary(&mut self, delay: Duration) -> Result<()> {
        self.flush().await?;
        tokio::time::sleep(delay).await;
        self.flush().await
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    /// Release the underlying stream. Bytes already buffered for reading are
    /// dropped.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

/// Run an I/O future under an optional deadline, translating the outcome into
/// the crate's error kinds.
async fn with_deadline<T, F>(limit: Option<Duration>, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| FfError::Timeout(format!("{what} after {}s", limit.as_secs_f32())))?,
        None => fut.await,
    };

    result.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => FfError::StreamClosed(what.to_string()),
        _ => FfError::Io(e),
    })
}
