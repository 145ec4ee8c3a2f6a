// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The printer's command catalogue.
//
// The wire protocol carries no in-band marker saying "binary follows". The
// client has to know, from the command it sent, which parser to run on the
// reply. Each variant therefore declares its `ReplyShape` next to its token,
// and `PrinterClient::execute` dispatches on that.

use std::fmt;

use ffctl_core::error::{FfError, Result};

/// Every request is terminated with CRLF.
const LINE_END: &str = "\r\n";

/// What follows the acknowledgement for a given command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// Content lines up to `ok`.
    Text,
    /// Text reply, then a file-list header block and one entry block per file.
    FileList,
    /// Text reply, then a single image block.
    Image,
}

/// One request to the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Endstop / machine status (`M119`).
    Status,
    /// SD print progress (`M27`).
    Progress,
    /// Pause the running print (`M25`).
    Pause,
    /// Resume a paused print (`M24`).
    Resume,
    /// List files stored on the printer (`M661`).
    ListFiles,
    /// Fetch the preview image of a stored file (`M662`).
    GetImage { path: String },
    /// Begin a file transfer of `length` bytes to `path` (`M28`).
    UploadOpen { length: u64, path: String },
    /// End the file transfer (`M29`).
    UploadClose,
    /// Start printing a stored file (`M23`).
    PrintFile { path: String },
    /// Ask for control of the printer (`M601 S1`).
    RequestControl,
    /// Machine type, firmware version and serial (`M115`).
    Info,
}

impl Command {
    /// The G-code token the printer echoes in its acknowledgement.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Status => "M119",
            Self::Progress => "M27",
            Self::Pause => "M25",
            Self::Resume => "M24",
            Self::ListFiles => "M661",
            Self::GetImage { .. } => "M662",
            Self::UploadOpen { .. } => "M28",
            Self::UploadClose => "M29",
            Self::PrintFile { .. } => "M23",
            Self::RequestControl => "M601",
            Self::Info => "M115",
        }
    }

    pub fn reply_shape(&self) -> ReplyShape {
        match self {
            Self::ListFiles => ReplyShape::FileList,
            Self::GetImage { .. } => ReplyShape::Image,
            _ => ReplyShape::Text,
        }
    }

    /// The exact bytes sent on the wire, CRLF included.
    ///
    /// Paths must be printable ASCII; anything else would either be
    /// mis-encoded or split the request across lines.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Self::GetImage { path } | Self::UploadOpen { path, .. } | Self::PrintFile { path } => {
                check_path(path)?
            }
            _ => {}
        }
        Ok(format!("{self}{LINE_END}").into_bytes())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.token();
        match self {
            Self::GetImage { path } => write!(f, "~{token} {path}"),
            Self::UploadOpen { length, path } => write!(f, "~{token} {length} 0:{path}"),
            Self::PrintFile { path } => write!(f, "~{token} 0:{path}"),
            Self::RequestControl => write!(f, "~{token} S1"),
            _ => write!(f, "~{token}"),
        }
    }
}

fn check_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(FfError::Validation("empty printer path".into()));
    }
    if let Some(bad) = path.chars().find(|c| !c.is_ascii() || c.is_ascii_control()) {
        return Err(FfError::Validation(format!(
            "printer path {path:?} contains {bad:?}; only printable ASCII is allowed"
        )));
    }
    Ok(())
}
