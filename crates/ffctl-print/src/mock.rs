// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory printer double for tests.
//
// Reads are served from a canned byte script. Every write call and flush is
// recorded in order with a timestamp, so tests can check how the engine split
// its output into separate writes and how long it waited between them.

use std::io::{self, Cursor, Read};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

#[derive(Debug, Clone)]
pub(crate) enum Event {
    Write { bytes: Vec<u8>, at: Instant },
    Flush { at: Instant },
}

pub(crate) struct MockStream {
    input: Cursor<Vec<u8>>,
    events: Vec<Event>,
    /// Fail every write once this many write calls have succeeded.
    fail_after_writes: Option<usize>,
}

impl MockStream {
    pub(crate) fn new(script: &[u8]) -> Self {
        Self {
            input: Cursor::new(script.to_vec()),
            events: Vec::new(),
            fail_after_writes: None,
        }
    }

    pub(crate) fn failing_after(mut self, writes: usize) -> Self {
        self.fail_after_writes = Some(writes);
        self
    }

    pub(crate) fn events(&self) -> &[Event] {
        &self.events
    }

    /// Each write call's bytes, in order.
    pub(crate) fn write_calls(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write { bytes, .. } => Some(bytes.clone()),
                Event::Flush { .. } => None,
            })
            .collect()
    }

    /// Everything written, concatenated.
    pub(crate) fn written(&self) -> Vec<u8> {
        self.write_calls().concat()
    }

    pub(crate) fn flush_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Flush { .. }))
            .count()
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let n = this.input.read(buf.initialize_unfilled())?;
        buf.advance(n);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let done = this
            .events
            .iter()
            .filter(|e| matches!(e, Event::Write { .. }))
            .count();
        if this.fail_after_writes.is_some_and(|limit| done >= limit) {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock peer went away",
            )));
        }
        this.events.push(Event::Write {
            bytes: buf.to_vec(),
            at: Instant::now(),
        });
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().events.push(Event::Flush { at: Instant::now() });
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A well-formed text reply: acknowledgement, content lines, `ok`.
pub(crate) fn text_reply(token: &str, lines: &[&str]) -> Vec<u8> {
    let mut out = format!("CMD {token} Received.\r\n").into_bytes();
    for line in lines {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"ok\r\n");
    out
}

/// An 8-byte block header followed by `payload`.
pub(crate) fn block(magic: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = magic.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}
