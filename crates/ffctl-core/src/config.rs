// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FfError, Result};

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Persistent client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Port used when the printer address carries none (default 8899).
    pub default_port: u16,
    /// Upload chunk size in bytes.
    pub chunk_size: usize,
    /// Report upload progress after every N chunks.
    pub progress_every: u64,
    /// Pause between the last data chunk and the upload-close command.
    ///
    /// The printer stores whatever arrives in the same TCP segment as the
    /// file tail, so the close command must land in its own packet. A flush
    /// alone lets the stack coalesce the two writes; this delay is what
    /// forces the boundary. Setting it to zero corrupts uploads on real
    /// firmware.
    pub packet_boundary_delay_ms: u64,
    /// Per read/write deadline. `None` blocks indefinitely.
    pub io_timeout_secs: Option<u64>,
    /// Multicast group and port the discovery probe is sent to.
    pub discovery_group: String,
    /// How long to collect discovery replies.
    pub discovery_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_port: crate::types::DEFAULT_PORT,
            chunk_size: 1024,
            progress_every: 10,
            packet_boundary_delay_ms: 100,
            io_timeout_secs: None,
            discovery_group: "225.0.0.9:19000".into(),
            discovery_timeout_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Load the configuration at `path`, falling back to defaults when the
    /// file does not exist. A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings the upload loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(FfError::Validation("chunk_size must be at least 1".into()));
        }
        if self.progress_every == 0 {
            return Err(FfError::Validation(
                "progress_every must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn packet_boundary_delay(&self) -> Duration {
        Duration::from_millis(self.packet_boundary_delay_ms)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_secs.map(Duration::from_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}

/// Default location of the configuration file.
///
/// `$XDG_CONFIG_HOME/ffctl/config.json`, then `$HOME/.config/ffctl/config.json`,
/// then a path relative to the working directory.
pub fn default_config_path() -> PathBuf {
    config_base().join("ffctl").join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.packet_boundary_delay(), Duration::from_millis(100));
        assert_eq!(config.io_timeout(), None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "chunk_size": 4096, "io_timeout_secs": 30 }"#).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.io_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.default_port, 8899);
        assert_eq!(config.progress_every, 10);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = ClientConfig {
            discovery_timeout_ms: 2500,
            ..ClientConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ClientConfig::load(&path),
            Err(FfError::Serialization(_))
        ));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "chunk_size": 0 }"#).unwrap();
        assert!(matches!(
            ClientConfig::load(&path),
            Err(FfError::Validation(_))
        ));
    }
}
