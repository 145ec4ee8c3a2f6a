// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for ffctl.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::FfError;

/// TCP port the printer's control service listens on.
pub const DEFAULT_PORT: u16 = 8899;

/// A printer address as given on the command line: `host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host[:port]`, using `default_port` when no port is given.
    ///
    /// Bracketed IPv6 literals (`[fe80::1]:8899`) are accepted; a bare IPv6
    /// literal without brackets is taken as a host with no port.
    pub fn parse_with_default(s: &str, default_port: u16) -> Result<Self, FfError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FfError::Validation("empty printer address".into()));
        }

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                FfError::Validation(format!("unterminated IPv6 literal in {s:?}"))
            })?;
            let port = match tail {
                "" => default_port,
                _ => {
                    let p = tail.strip_prefix(':').ok_or_else(|| {
                        FfError::Validation(format!("unexpected text after ']' in {s:?}"))
                    })?;
                    parse_port(p, s)?
                }
            };
            return Ok(Self::new(host, port));
        }

        // More than one colon: an unbracketed IPv6 literal, no port.
        if s.matches(':').count() > 1 {
            return Ok(Self::new(s, default_port));
        }

        match s.split_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(FfError::Validation(format!("missing host in {s:?}")));
                }
                Ok(Self::new(host, parse_port(port, s)?))
            }
            None => Ok(Self::new(s, default_port)),
        }
    }

    /// The `host:port` form accepted by socket connect calls.
    pub fn socket_addr_string(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(port: &str, whole: &str) -> Result<u16, FfError> {
    port.parse()
        .map_err(|_| FfError::Validation(format!("invalid port {port:?} in {whole:?}")))
}

impl FromStr for HostPort {
    type Err = FfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default(s, DEFAULT_PORT)
    }
}

impl std::fmt::Display for HostPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.socket_addr_string())
    }
}

/// A printer that answered the UDP discovery probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredPrinter {
    /// Name the printer reported (NUL padding stripped).
    pub name: String,
    /// Source address of the reply datagram.
    pub ip: IpAddr,
    /// When the reply was received.
    pub last_seen: DateTime<Utc>,
}

/// Snapshot of an upload in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes written to the stream so far.
    pub sent: u64,
    /// Declared total length of the upload.
    pub total: u64,
    /// Data chunks written so far.
    pub chunks: u64,
}

impl UploadProgress {
    /// Percentage complete. An empty upload is reported as complete.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.sent as f64 / self.total as f64 * 100.0
        }
    }
}
