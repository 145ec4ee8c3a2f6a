// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Handing preview images to the desktop's image viewer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Write `png` to a temporary `.png` file that outlives the process, so the
/// viewer can still read it after we exit.
pub fn save_temp_png(png: &[u8]) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("ffctl-preview-")
        .suffix(".png")
        .tempfile()
        .context("creating temporary preview file")?;
    file.write_all(png).context("writing preview")?;
    let (_, path) = file.keep().context("keeping preview file")?;
    debug!(path = %path.display(), bytes = png.len(), "preview written");
    Ok(path)
}

/// Launch the platform's default viewer on `path` without waiting for it.
pub fn open(path: &Path) -> Result<()> {
    let mut cmd = opener(path);
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    cmd.spawn()
        .with_context(|| format!("launching a viewer for {}", path.display()))?;
    info!(path = %path.display(), "preview opened");
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}
