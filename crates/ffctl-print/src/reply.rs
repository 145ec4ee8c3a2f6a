// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command/reply exchange.
//
// A text exchange on the wire looks like:
//
//   -> ~M119\r\n
//   <- CMD M119 Received.\r\n      acknowledgement (exactly one)
//   <- Endstop: X-max:0 ...\r\n    content lines (zero or more)
//   <- ok\r\n                      terminator (exactly one)
//
// The acknowledgement is the only gate between a real printer and noise,
// wrong firmware, or some other service on the port, so anything that does
// not match it ends the exchange.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, instrument, trace};

use ffctl_core::error::{FfError, Result};

use crate::command::Command;
use crate::transport::Connection;

/// Line that ends every text reply.
pub const TERMINATOR: &str = "ok";

/// Matcher for `CMD <TOKEN> Received.` at the start of a line, where
/// `<TOKEN>` is one or more of `0-9` / `A-Z`.
#[derive(Debug)]
pub struct AckPattern {
    prefix: &'static str,
    suffix: &'static str,
}

/// The acknowledgement matcher. Immutable and shared process-wide.
pub static ACKNOWLEDGEMENT: AckPattern = AckPattern {
    prefix: "CMD ",
    suffix: " Received.",
};

impl AckPattern {
    /// Return the echoed token if `line` is an acknowledgement.
    pub fn token<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix(self.prefix)?;
        let end = rest
            .find(|c: char| !(c.is_ascii_digit() || c.is_ascii_uppercase()))
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        let (token, tail) = rest.split_at(end);
        tail.starts_with(self.suffix).then_some(token)
    }

    pub fn matches(&self, line: &str) -> bool {
        self.token(line).is_some()
    }
}

/// Send `command` and collect its text reply.
///
/// Returns the content lines in the order received, with trailing whitespace
/// trimmed. Neither the acknowledgement nor the `ok` terminator is included.
/// On any error the lines read so far are discarded and the connection should
/// not be reused.
#[instrument(skip(conn), fields(peer = %conn.peer(), token = command.token()))]
pub async fn send_command<S>(conn: &mut Connection<S>, command: &Command) -> Result<Vec<String>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = command.encode()?;
    exchange(conn, &request).await
}

/// Send raw request bytes verbatim and collect the text reply.
pub async fn exchange<S>(conn: &mut Connection<S>, request: &[u8]) -> Result<Vec<String>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.write_all(request).await?;

    let ack = conn.read_line().await?;
    let token = ACKNOWLEDGEMENT.token(&ack).ok_or_else(|| FfError::BadAcknowledgement {
        command: String::from_utf8_lossy(request).trim_end().to_string(),
        line: ack.trim_end().to_string(),
    })?;
    debug!(token, "command acknowledged");

    let mut lines = Vec::new();
    loop {
        let line = conn.read_line().await?;
        let line = line.trim_end();
        if line == TERMINATOR {
            break;
        }
        trace!(line, "reply line");
        lines.push(line.to_string());
    }

    debug!(lines = lines.len(), "reply complete");
    Ok(lines)
}
