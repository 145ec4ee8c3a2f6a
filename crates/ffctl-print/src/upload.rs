// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File upload sequencer.
//
// Sequence on the wire:
//   1. `~M28 <length> 0:/user/<name>` and its text reply
//   2. exactly <length> raw bytes, written in bounded chunks
//   3. packet boundary (flush, delay, flush)
//   4. `~M29` and its text reply
//   5. optionally `~M23 0:/user/<name>` to start printing
//
// Step 3 is part of the protocol, not a tuning knob. If `~M29` shares a TCP
// segment with the tail of the file, the printer writes it into the stored
// file.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, info, instrument};

use ffctl_core::config::ClientConfig;
use ffctl_core::error::{FfError, Result};
use ffctl_core::types::UploadProgress;

use crate::command::Command;
use crate::job::{USER_DIR, print_file};
use crate::reply::send_command;
use crate::transport::Connection;

/// Longest file name the printer's storage accepts, in ASCII bytes.
pub const MAX_REMOTE_NAME_LEN: usize = 36;

/// Tunables for one upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub chunk_size: usize,
    /// Report progress after every N chunks.
    pub progress_every: u64,
    /// Wait between the final chunk and upload-close. See the module docs.
    pub packet_boundary_delay: Duration,
    /// Start printing the file once the upload is closed.
    pub print_after: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for UploadOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            progress_every: config.progress_every.max(1),
            packet_boundary_delay: config.packet_boundary_delay(),
            print_after: false,
        }
    }
}

/// What an upload reports to its caller while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEvent<'a> {
    /// The printer accepted the transfer; these are its reply lines to the
    /// upload-open command. Delivered once, before any data is sent.
    Opened(&'a [String]),
    /// Data sent so far.
    Progress(UploadProgress),
}

/// Everything the printer said during an upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Where the file was stored on the printer.
    pub remote_path: String,
    pub bytes_sent: u64,
    pub open_reply: Vec<String>,
    pub close_reply: Vec<String>,
    /// Reply to the print command, if one was requested.
    pub print_reply: Option<Vec<String>>,
}

/// The name a local file will be stored under on the printer.
///
/// This is the file's base name, which must be ASCII and at most
/// [`MAX_REMOTE_NAME_LEN`] bytes long.
pub fn remote_file_name(local: &Path) -> Result<String> {
    let name = local
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FfError::Validation(format!("{} has no usable file name", local.display())))?;

    if !name.is_ascii() {
        return Err(FfError::Validation(format!(
            "file name {name:?} must be ASCII"
        )));
    }
    if name.len() > MAX_REMOTE_NAME_LEN {
        return Err(FfError::Validation(format!(
            "file name {name:?} is {} bytes; the printer allows at most {MAX_REMOTE_NAME_LEN}",
            name.len()
        )));
    }
    Ok(name.to_string())
}

/// Stream `total_len` bytes from `source` to the printer as `local_name`'s
/// base name.
///
/// The name is validated before anything is written to the connection. The
/// source must yield exactly `total_len` bytes; fewer or more is a validation
/// error, detected before the offending chunk is sent. Any write failure ends
/// the upload. `on_event` first gets the upload-open reply, then progress
/// after every `options.progress_every`-th chunk and once more at the end if
/// that last chunk was not already reported.
#[instrument(skip_all, fields(peer = %conn.peer(), file = %local_name.display(), total_len = total_len))]
pub async fn upload<S, R, F>(
    conn: &mut Connection<S>,
    local_name: &Path,
    total_len: u64,
    mut source: R,
    options: &UploadOptions,
    mut on_event: F,
) -> Result<UploadOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
    F: FnMut(UploadEvent<'_>),
{
    let name = remote_file_name(local_name)?;
    let remote_path = format!("{USER_DIR}{name}");
    let chunk_size = options.chunk_size.max(1);
    let progress_every = options.progress_every.max(1);

    info!(remote = %remote_path, bytes = total_len, "starting upload");
    let open_reply = send_command(
        conn,
        &Command::UploadOpen {
            length: total_len,
            path: remote_path.clone(),
        },
    )
    .await?;
    on_event(UploadEvent::Opened(&open_reply));

    let mut progress = UploadProgress {
        sent: 0,
        total: total_len,
        chunks: 0,
    };
    let mut buf = vec![0u8; chunk_size];

    loop {
        let remaining = total_len - progress.sent;
        if remaining == 0 {
            ensure_exhausted(&mut source, total_len).await?;
            break;
        }

        let want = remaining.min(chunk_size as u64) as usize;
        let got = fill(&mut source, &mut buf[..want]).await?;
        if got < want {
            return Err(FfError::Validation(format!(
                "source ended after {} of {total_len} declared bytes",
                progress.sent + got as u64
            )));
        }

        conn.write_all(&buf[..want]).await?;
        progress.sent += want as u64;
        progress.chunks += 1;

        if progress.chunks % progress_every == 0 {
            debug!(sent = progress.sent, total = total_len, "upload progress");
            on_event(UploadEvent::Progress(progress));
        }
    }
    if progress.chunks == 0 || progress.chunks % progress_every != 0 {
        on_event(UploadEvent::Progress(progress));
    }

    conn.packet_boundary(options.packet_boundary_delay).await?;
    let close_reply = send_command(conn, &Command::UploadClose).await?;
    info!(remote = %remote_path, bytes = progress.sent, "upload finished");

    let print_reply = if options.print_after {
        Some(print_file(conn, &name).await?)
    } else {
        None
    };

    Ok(UploadOutcome {
        remote_path,
        bytes_sent: progress.sent,
        open_reply,
        close_reply,
        print_reply,
    })
}

/// Read until `buf` is full or the source ends. Returns the bytes read.
async fn fill<R: AsyncRead + Unpin>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn ensure_exhausted<R: AsyncRead + Unpin>(source: &mut R, total_len: u64) -> Result<()> {
    let mut probe = [0u8; 1];
    if source.read(&mut probe).await? != 0 {
        return Err(FfError::Validation(format!(
            "source holds more than the {total_len} declared bytes"
        )));
    }
    Ok(())
}
