// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binary block reader.
//
// Some commands are answered with binary records after the text reply:
//
//   [4-byte magic][u32 big-endian length][length bytes of payload]
//
// The magic identifies what the record is. A file listing is one header
// record whose length field is the entry count (no payload), followed by one
// entry record per file whose payload is the ASCII file name. A preview image
// is a single record whose payload is PNG data.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use ffctl_core::error::{FfError, Result};

use crate::transport::Connection;

/// Size of a block header on the wire.
pub const HEADER_LEN: usize = 8;

/// Largest payload accepted before the length is treated as corrupt.
pub const MAX_BLOCK_LEN: u32 = 16 * 1024 * 1024;

/// Largest file count accepted in a file-list header.
pub const MAX_FILE_COUNT: u32 = 65_536;

/// 4-byte tag at the start of every block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Magic(pub [u8; 4]);

impl Magic {
    /// File-list header; the length field is the number of entries.
    pub const FILE_LIST: Magic = Magic(*b"D\xaa\xaaD");
    /// One file-list entry; payload is the file name.
    pub const FILE_ENTRY: Magic = Magic(*b"::\xa3\xa3");
    /// Preview image; payload is PNG bytes.
    pub const IMAGE: Magic = Magic(*b"**\xa2\xa2");
}

/// A decoded block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub magic: [u8; 4],
    pub length: u32,
}

impl BlockHeader {
    pub fn decode(bytes: [u8; HEADER_LEN]) -> Self {
        let [m0, m1, m2, m3, l0, l1, l2, l3] = bytes;
        Self {
            magic: [m0, m1, m2, m3],
            length: u32::from_be_bytes([l0, l1, l2, l3]),
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&self.magic);
        out[4..].copy_from_slice(&self.length.to_be_bytes());
        out
    }

    /// Return the length field if the tag is `expected`.
    pub fn expect(self, expected: Magic) -> Result<u32> {
        if self.magic != expected.0 {
            return Err(FfError::MagicMismatch {
                expected: expected.0,
                actual: self.magic,
            });
        }
        Ok(self.length)
    }
}

/// Read one header and check its tag. No payload is read.
pub async fn read_header<S>(conn: &mut Connection<S>, expected: Magic) -> Result<u32>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = conn.read_exact(HEADER_LEN).await?;
    let mut bytes = [0u8; HEADER_LEN];
    bytes.copy_from_slice(&raw);
    let header = BlockHeader::decode(bytes);
    trace!(magic = ?header.magic, length = header.length, "block header");
    header.expect(expected)
}

/// Read one header with tag `expected`, then exactly its payload.
///
/// The tag is checked before any payload byte is read.
pub async fn read_block<S>(conn: &mut Connection<S>, expected: Magic) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let length = read_header(conn, expected).await?;
    if length > MAX_BLOCK_LEN {
        return Err(FfError::Protocol(format!(
            "block length {length} exceeds {MAX_BLOCK_LEN} bytes"
        )));
    }
    conn.read_exact(length as usize).await
}

/// Read a complete file listing.
///
/// The list is all-or-nothing: if the printer closes the stream before the
/// announced number of entries has arrived, the partial list is dropped.
pub async fn read_file_list<S>(conn: &mut Connection<S>) -> Result<Vec<String>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let count = read_header(conn, Magic::FILE_LIST).await?;
    if count > MAX_FILE_COUNT {
        return Err(FfError::Protocol(format!(
            "file list announces {count} entries (limit {MAX_FILE_COUNT})"
        )));
    }
    debug!(count, "reading file list");

    let mut names = Vec::with_capacity(count as usize);
    for received in 0..count {
        let payload = match read_block(conn, Magic::FILE_ENTRY).await {
            Ok(payload) => payload,
            Err(FfError::StreamClosed(_)) => {
                return Err(FfError::Protocol(format!(
                    "file list truncated: {count} entries announced, stream closed after {received}"
                )));
            }
            Err(e) => return Err(e),
        };
        if !payload.is_ascii() {
            return Err(FfError::Protocol(format!(
                "non-ASCII file name in listing: {:?}",
                String::from_utf8_lossy(&payload)
            )));
        }
        names.push(String::from_utf8(payload).map_err(|e| FfError::Protocol(e.to_string()))?);
    }
    Ok(names)
}

/// Read a preview image block. The payload is returned undecoded.
pub async fn read_image<S>(conn: &mut Connection<S>) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let image = read_block(conn, Magic::IMAGE).await?;
    debug!(bytes = image.len(), "read preview image");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockStream, block};

    fn header(magic: Magic, length: u32) -> Vec<u8> {
        BlockHeader {
            magic: magic.0,
            length,
        }
        .encode()
        .to_vec()
    }

    #[test]
    fn header_is_big_endian() {
        let h = BlockHeader::decode(*b"**\xa2\xa2\x00\x00\x01\x02");
        assert_eq!(h.magic, Magic::IMAGE.0);
        assert_eq!(h.length, 258);
        assert_eq!(h.encode(), *b"**\xa2\xa2\x00\x00\x01\x02");
    }

    #[tokio::test]
    async fn read_block_returns_payload() {
        let mut conn = Connection::new(MockStream::new(&block(b"**\xa2\xa2", b"\x89PNG")), "mock");
        assert_eq!(read_block(&mut conn, Magic::IMAGE).await.unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn wrong_magic_fails_before_payload() {
        // Header claims 5 payload bytes but the stream holds none: a
        // StreamClosed here would mean the payload read was attempted.
        let script = header(Magic::FILE_ENTRY, 5);
        let mut conn = Connection::new(MockStream::new(&script), "mock");

        match read_block(&mut conn, Magic::IMAGE).await {
            Err(FfError::MagicMismatch { expected, actual }) => {
                assert_eq!(expected, Magic::IMAGE.0);
                assert_eq!(actual, Magic::FILE_ENTRY.0);
            }
            other => panic!("expected MagicMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_block_is_rejected() {
        let script = header(Magic::IMAGE, MAX_BLOCK_LEN + 1);
        let mut conn = Connection::new(MockStream::new(&script), "mock");
        assert!(matches!(
            read_block(&mut conn, Magic::IMAGE).await,
            Err(FfError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn file_list_reads_exactly_count_entries() {
        let mut script = header(Magic::FILE_LIST, 2);
        script.extend(block(&Magic::FILE_ENTRY.0, b"/data/cube.gx"));
        script.extend(block(&Magic::FILE_ENTRY.0, b"/data/benchy.gx"));
        // A third entry the header did not announce stays unread.
        script.extend(block(&Magic::FILE_ENTRY.0, b"/data/extra.gx"));
        let mut conn = Connection::new(MockStream::new(&script), "mock");

        let files = read_file_list(&mut conn).await.unwrap();
        assert_eq!(files, vec!["/data/cube.gx", "/data/benchy.gx"]);
        assert_eq!(
            read_block(&mut conn, Magic::FILE_ENTRY).await.unwrap(),
            b"/data/extra.gx"
        );
    }

    #[tokio::test]
    async fn empty_file_list() {
        let mut conn = Connection::new(MockStream::new(&header(Magic::FILE_LIST, 0)), "mock");
        assert!(read_file_list(&mut conn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_file_list_is_protocol_error() {
        let mut script = header(Magic::FILE_LIST, 3);
        script.extend(block(&Magic::FILE_ENTRY.0, b"a.gx"));
        script.extend(block(&Magic::FILE_ENTRY.0, b"b.gx"));
        let mut conn = Connection::new(MockStream::new(&script), "mock");

        let err = read_file_list(&mut conn).await.unwrap_err();
        assert!(matches!(err, FfError::Protocol(ref msg) if msg.contains("after 2")));
    }

    #[tokio::test]
    async fn entry_with_wrong_magic_is_rejected() {
        let mut script = header(Magic::FILE_LIST, 1);
        script.extend(block(&Magic::IMAGE.0, b"a.gx"));
        let mut conn = Connection::new(MockStream::new(&script), "mock");
        assert!(matches!(
            read_file_list(&mut conn).await,
            Err(FfError::MagicMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn absurd_file_count_is_rejected() {
        let mut conn = Connection::new(
            MockStream::new(&header(Magic::FILE_LIST, MAX_FILE_COUNT + 1)),
            "mock",
        );
        assert!(matches!(
            read_file_list(&mut conn).await,
            Err(FfError::Protocol(_))
        ));
    }
}
