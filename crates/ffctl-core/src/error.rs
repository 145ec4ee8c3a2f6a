// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ffctl.

use thiserror::Error;

/// Top-level error type for all printer operations.
///
/// Nothing in the protocol engine recovers locally: every variant aborts the
/// command or upload in flight and is handed back to the caller with enough
/// context (the raw offending line or tag bytes) to tell a firmware mismatch
/// from a noisy link.
#[derive(Debug, Error)]
pub enum FfError {
    // -- Connection --
    #[error("connection to {addr} failed: {reason}")]
    Connection { addr: String, reason: String },

    #[error("printer closed the stream while {0}")]
    StreamClosed(String),

    #[error("printer did not answer in time: {0}")]
    Timeout(String),

    // -- Protocol --
    #[error("unknown reply to command {command:?}: {line:?}")]
    BadAcknowledgement { command: String, line: String },

    #[error("block magic mismatch: expected {expected:02x?}, got {actual:02x?}")]
    MagicMismatch { expected: [u8; 4], actual: [u8; 4] },

    #[error("protocol error: {0}")]
    Protocol(String),

    // -- Caller contract --
    #[error("invalid input: {0}")]
    Validation(String),

    // -- Discovery --
    #[error("printer discovery failed: {0}")]
    Discovery(String),

    // -- Local I/O / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FfError {
    /// Whether this error means the printer said something we did not expect
    /// (bad acknowledgement, wrong block tag, or malformed framing).
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::BadAcknowledgement { .. } | Self::MagicMismatch { .. } | Self::Protocol(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_kind_groups_wire_errors() {
        assert!(
            FfError::BadAcknowledgement {
                command: "~M119".into(),
                line: "garbage".into(),
            }
            .is_protocol()
        );
        assert!(
            FfError::MagicMismatch {
                expected: *b"**\xa2\xa2",
                actual: *b"abcd",
            }
            .is_protocol()
        );
        assert!(FfError::Protocol("short list".into()).is_protocol());
        assert!(!FfError::StreamClosed("reading a line".into()).is_protocol());
        assert!(!FfError::Validation("name too long".into()).is_protocol());
    }

    #[test]
    fn magic_mismatch_message_shows_both_tags() {
        let err = FfError::MagicMismatch {
            expected: [0x44, 0xaa, 0xaa, 0x44],
            actual: [0x3a, 0x3a, 0xa3, 0xa3],
        };
        let msg = err.to_string();
        assert!(msg.contains("44, aa, aa, 44"));
        assert!(msg.contains("3a, 3a, a3, a3"));
    }
}
