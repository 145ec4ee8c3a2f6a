// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// UDP multicast discovery of printers on the local network.
//
// A fixed probe datagram goes to the printers' multicast group; each printer
// answers with a datagram whose first 32 bytes are its NUL-padded ASCII name.
// The remaining bytes of the reply are not understood and are ignored.

use std::net::{IpAddr, UdpSocket};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use ffctl_core::error::{FfError, Result};
use ffctl_core::types::DiscoveredPrinter;

/// Probe payload printers respond to.
pub const PROBE: &[u8] = b"c0a800de46500000";

/// Length of the name field at the start of a reply.
pub const NAME_LEN: usize = 32;

/// Default multicast group and port.
pub const DEFAULT_GROUP: &str = "225.0.0.9:19000";

/// Polling interval while waiting for replies.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Send one probe to `group` and collect replies for `timeout`.
///
/// Printers are returned in the order they first answered; repeat replies
/// from the same address are dropped. Datagrams that don't carry an ASCII
/// name are logged and skipped.
pub fn discover_printers(group: &str, timeout: Duration) -> Result<Vec<DiscoveredPrinter>> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .map_err(|e| FfError::Discovery(format!("bind: {e}")))?;

    socket
        .send_to(PROBE, group)
        .map_err(|e| FfError::Discovery(format!("send probe to {group}: {e}")))?;
    debug!(group, "discovery probe sent");

    let deadline = Instant::now() + timeout;
    let mut printers: Vec<DiscoveredPrinter> = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        socket
            .set_read_timeout(Some(remaining.min(POLL_INTERVAL)))
            .map_err(|e| FfError::Discovery(format!("set timeout: {e}")))?;

        match socket.recv_from(&mut buf) {
            Ok((len, addr)) => {
                let Some(printer) = parse_reply(&buf[..len], addr.ip()) else {
                    warn!(from = %addr, len, "ignoring unrecognised discovery reply");
                    continue;
                };
                if printers.iter().any(|p| p.ip == printer.ip) {
                    continue;
                }
                info!(name = %printer.name, ip = %printer.ip, "printer found");
                printers.push(printer);
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(FfError::Discovery(format!("receive: {e}"))),
        }
    }

    Ok(printers)
}

/// Discover printers without blocking the async runtime.
pub async fn discover_printers_async(
    group: String,
    timeout: Duration,
) -> Result<Vec<DiscoveredPrinter>> {
    tokio::task::spawn_blocking(move || discover_printers(&group, timeout))
        .await
        .map_err(|e| FfError::Discovery(e.to_string()))?
}

/// Decode a discovery reply. Only the name field is interpreted.
pub fn parse_reply(data: &[u8], ip: IpAddr) -> Option<DiscoveredPrinter> {
    let field = &data[..data.len().min(NAME_LEN)];
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let name = &field[..end];
    if name.is_empty() || !name.is_ascii() {
        return None;
    }
    Some(DiscoveredPrinter {
        name: String::from_utf8_lossy(name).into_owned(),
        ip,
        last_seen: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(name: &str) -> Vec<u8> {
        let mut data = vec![0u8; 140];
        data[..name.len()].copy_from_slice(name.as_bytes());
        data[132..].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data
    }

    #[test]
    fn name_is_nul_trimmed() {
        let ip: IpAddr = "192.168.1.77".parse().unwrap();
        let printer = parse_reply(&reply("Adventurer3"), ip).unwrap();
        assert_eq!(printer.name, "Adventurer3");
        assert_eq!(printer.ip, ip);
    }

    #[test]
    fn full_width_name_without_nul() {
        let name = "N".repeat(NAME_LEN);
        let mut data = name.clone().into_bytes();
        data.extend_from_slice(b"trailing junk");
        let printer = parse_reply(&data, "10.0.0.1".parse().unwrap()).unwrap();
        assert_eq!(printer.name, name);
    }

    #[test]
    fn rejects_empty_or_binary_names() {
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(parse_reply(&[0u8; 140], ip).is_none());
        assert!(parse_reply(b"\xff\xfe\x00", ip).is_none());
        assert!(parse_reply(b"", ip).is_none());
    }

    #[test]
    fn collects_reply_from_loopback_responder() {
        let responder = UdpSocket::bind("127.0.0.1:0").unwrap();
        let group = responder.local_addr().unwrap().to_string();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 64];
            let (len, from) = responder.recv_from(&mut buf).unwrap();
            assert_eq!(&buf[..len], PROBE);
            let answer = reply("Finder");
            responder.send_to(&answer, from).unwrap();
            responder.send_to(&answer, from).unwrap();
        });

        let printers = discover_printers(&group, Duration::from_millis(500)).unwrap();
        handle.join().unwrap();

        assert_eq!(printers.len(), 1);
        assert_eq!(printers[0].name, "Finder");
        assert_eq!(printers[0].ip.to_string(), "127.0.0.1");
    }
}
