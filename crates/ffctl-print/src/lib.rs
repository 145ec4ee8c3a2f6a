// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ffctl-print: the FlashForge network protocol engine.
//
// Layering, leaf first:
//   transport: one TCP byte stream with line/exact/raw primitives
//   reply: send one command, validate the acknowledgement, collect lines
//          up to `ok`
//   block: magic-tagged, length-prefixed binary records (file lists and
//          preview images)
//   upload: chunked file streaming with the mandatory packet boundary
//           before upload-close
//   discovery: UDP multicast probe for printers on the local network
//
// `PrinterClient` ties these together behind one method per command.

pub mod block;
pub mod client;
pub mod command;
pub mod discovery;
pub mod job;
pub mod reply;
pub mod transport;
pub mod upload;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{PrinterClient, Reply};
pub use command::{Command, ReplyShape};
pub use discovery::{discover_printers, discover_printers_async};
pub use transport::Connection;
pub use upload::{UploadEvent, UploadOptions, UploadOutcome};
