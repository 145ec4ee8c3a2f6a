// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// High-level printer client.
//
// One method per printer command. Each method issues exactly one `Command`
// and runs the parser its `ReplyShape` calls for.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use ffctl_core::config::ClientConfig;
use ffctl_core::error::{FfError, Result};
use ffctl_core::types::HostPort;

use crate::block::{read_file_list, read_image};
use crate::command::{Command, ReplyShape};
use crate::job;
use crate::reply::send_command;
use crate::transport::Connection;
use crate::upload::{self, UploadEvent, UploadOptions, UploadOutcome};

/// A parsed reply, tagged by the shape its command declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(Vec<String>),
    FileList(Vec<String>),
    Image(Vec<u8>),
}

/// A session with one printer over one connection.
pub struct PrinterClient<S = TcpStream> {
    conn: Connection<S>,
    config: ClientConfig,
}

impl PrinterClient<TcpStream> {
    /// Connect to the printer at `addr`.
    pub async fn connect(addr: &HostPort, config: ClientConfig) -> Result<Self> {
        let conn = Connection::connect(addr, config.io_timeout()).await?;
        Ok(Self::new(conn, config))
    }
}

impl<S> PrinterClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(conn: Connection<S>, config: ClientConfig) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send any command and parse its reply according to its shape.
    pub async fn execute(&mut self, command: &Command) -> Result<Reply> {
        let lines = send_command(&mut self.conn, command).await?;
        match command.reply_shape() {
            ReplyShape::Text => Ok(Reply::Text(lines)),
            ReplyShape::FileList => {
                debug!(?lines, "file list preamble");
                read_file_list(&mut self.conn).await.map(Reply::FileList)
            }
            ReplyShape::Image => {
                debug!(?lines, "image preamble");
                read_image(&mut self.conn).await.map(Reply::Image)
            }
        }
    }

    pub async fn status(&mut self) -> Result<Vec<String>> {
        send_command(&mut self.conn, &Command::Status).await
    }

    pub async fn progress(&mut self) -> Result<Vec<String>> {
        send_command(&mut self.conn, &Command::Progress).await
    }

    pub async fn pause(&mut self) -> Result<Vec<String>> {
        send_command(&mut self.conn, &Command::Pause).await
    }

    pub async fn resume(&mut self) -> Result<Vec<String>> {
        send_command(&mut self.conn, &Command::Resume).await
    }

    pub async fn info(&mut self) -> Result<Vec<String>> {
        send_command(&mut self.conn, &Command::Info).await
    }

    pub async fn request_control(&mut self) -> Result<Vec<String>> {
        send_command(&mut self.conn, &Command::RequestControl).await
    }

    /// Names of the files stored on the printer.
    pub async fn list_files(&mut self) -> Result<Vec<String>> {
        match self.execute(&Command::ListFiles).await? {
            Reply::FileList(names) => Ok(names),
            other => Err(unexpected_reply(&Command::ListFiles, &other)),
        }
    }

    /// PNG preview of a stored file, exactly as sent by the printer.
    pub async fn get_image(&mut self, path: &str) -> Result<Vec<u8>> {
        let command = Command::GetImage {
            path: path.to_string(),
        };
        match self.execute(&command).await? {
            Reply::Image(png) => Ok(png),
            other => Err(unexpected_reply(&command, &other)),
        }
    }

    /// Start printing a stored file. Relative names are looked up under
    /// `/user/`.
    pub async fn print_file(&mut self, path: &str) -> Result<Vec<String>> {
        job::print_file(&mut self.conn, path).await
    }

    /// Upload `total_len` bytes from `source`, stored under the base name of
    /// `local_name`, optionally starting a print afterwards.
    pub async fn upload<R, F>(
        &mut self,
        local_name: &Path,
        total_len: u64,
        source: R,
        print_after: bool,
        on_event: F,
    ) -> Result<UploadOutcome>
    where
        R: AsyncRead + Unpin,
        F: FnMut(UploadEvent<'_>),
    {
        let options = UploadOptions {
            print_after,
            ..UploadOptions::from(&self.config)
        };
        upload::upload(&mut self.conn, local_name, total_len, source, &options, on_event).await
    }

    /// Upload a local file; its size is taken from the file system.
    pub async fn upload_file<F>(
        &mut self,
        path: &Path,
        print_after: bool,
        on_event: F,
    ) -> Result<UploadOutcome>
    where
        F: FnMut(UploadEvent<'_>),
    {
        // Fail on the name before touching the file or the network.
        upload::remote_file_name(path)?;
        let file = tokio::fs::File::open(path).await?;
        let total_len = file.metadata().await?.len();
        self.upload(path, total_len, file, print_after, on_event).await
    }

    /// Release the connection.
    pub fn into_connection(self) -> Connection<S> {
        self.conn
    }
}

fn unexpected_reply(command: &Command, reply: &Reply) -> FfError {
    let shape = match reply {
        Reply::Text(_) => "text",
        Reply::FileList(_) => "file list",
        Reply::Image(_) => "image",
    };
    FfError::Protocol(format!("{} produced a {shape} reply", command.token()))
}
