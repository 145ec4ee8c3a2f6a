// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Starting a print from printer storage.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use ffctl_core::error::Result;

use crate::command::Command;
use crate::reply::send_command;
use crate::transport::Connection;

/// Directory uploads land in on the printer.
pub const USER_DIR: &str = "/user/";

/// Map a user-supplied path to the printer's storage layout: relative names
/// live under `/user/`, absolute paths are taken as-is.
pub fn printer_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{USER_DIR}{path}")
    }
}

/// Tell the printer to start printing a stored file.
pub async fn print_file<S>(conn: &mut Connection<S>, path: &str) -> Result<Vec<String>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let path = printer_path(path);
    info!(path = %path, "starting print");
    send_command(conn, &Command::PrintFile { path }).await
}
