// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a concrete next step.
// The severity tells the caller whether trying again could help; the protocol
// engine itself never retries.

use crate::error::FfError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy printer. Running the command again may work.
    Transient,
    /// The user must change something (address, file name, config).
    ActionRequired,
    /// The printer spoke a dialect we do not understand. Retrying won't help.
    Permanent,
}

/// A human-readable error with a plain English message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether running the same command again is worth it.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert an `FfError` into a `HumanError`.
pub fn humanize_error(err: &FfError) -> HumanError {
    match err {
        FfError::Connection { reason, .. } => humanize_connect_error(reason),

        FfError::StreamClosed(_) => HumanError {
            message: "The printer hung up in the middle of a reply.".into(),
            suggestion: "The printer may be busy with another client. Wait a moment and run the command again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FfError::Timeout(_) => HumanError {
            message: "The printer didn't answer in time.".into(),
            suggestion: "Check the printer is on and its network light is lit, or raise --timeout.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FfError::BadAcknowledgement { .. } | FfError::MagicMismatch { .. } => HumanError {
            message: "The printer replied in a format we don't recognise.".into(),
            suggestion: "Make sure the address points at a FlashForge printer's control port (usually 8899). Other firmware may not speak this protocol.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FfError::Protocol(detail) => HumanError {
            message: "The printer's reply was damaged or incomplete.".into(),
            suggestion: format!("This can happen on a noisy Wi-Fi link. Try again, preferably over a wired connection. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        FfError::Validation(detail) => HumanError {
            message: "That request can't be sent to the printer.".into(),
            suggestion: format!("Fix the input and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FfError::Discovery(_) => HumanError {
            message: "We can't search for printers right now.".into(),
            suggestion: "Make sure this computer is on the same network as the printer and that multicast traffic isn't blocked.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FfError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "Check the path and try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "We don't have permission to use that file.".into(),
                suggestion: "Check the file permissions, or copy the file somewhere readable first.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        FfError::Serialization(_) => HumanError {
            message: "The configuration file couldn't be read.".into(),
            suggestion: "Fix the JSON in the config file, or delete it to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_connect_error(reason: &str) -> HumanError {
    let lower = reason.to_ascii_lowercase();

    if lower.contains("refused") {
        HumanError {
            message: "The printer refused our connection.".into(),
            suggestion: "The printer may be off, or the port is wrong. FlashForge printers listen on port 8899.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("timed out") || lower.contains("unreachable") {
        HumanError {
            message: "We couldn't reach the printer.".into(),
            suggestion: "Check the printer is on and connected to the same network. `ffctl scan` lists printers it can see.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("lookup") || lower.contains("resolve") || lower.contains("name or service") {
        HumanError {
            message: "The printer address doesn't look right.".into(),
            suggestion: "Use an IP address like 192.168.1.100, optionally followed by :port.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "We couldn't connect to the printer.".into(),
            suggestion: format!("Try again. If this keeps happening, restart the printer. (Detail: {reason})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
