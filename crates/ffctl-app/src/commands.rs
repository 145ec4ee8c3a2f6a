// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers. Each one opens its own connection, runs a single
// exchange (or the upload sequence) and prints the result to stdout.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use ffctl_core::config::ClientConfig;
use ffctl_core::types::HostPort;
use ffctl_print::{PrinterClient, UploadEvent, discover_printers_async};

use crate::viewer;

async fn connect(host: &str, config: ClientConfig) -> Result<PrinterClient> {
    let addr = HostPort::parse_with_default(host, config.default_port)?;
    let client = PrinterClient::connect(&addr, config).await?;
    Ok(client)
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

pub async fn scan(config: &ClientConfig) -> Result<()> {
    let printers =
        discover_printers_async(config.discovery_group.clone(), config.discovery_timeout())
            .await?;
    if printers.is_empty() {
        eprintln!("No printers answered on {}", config.discovery_group);
    }
    for printer in &printers {
        println!("Found {} at {}", printer.name, printer.ip);
    }
    Ok(())
}

pub async fn status(host: &str, config: ClientConfig) -> Result<()> {
    let mut client = connect(host, config).await?;
    print_lines(&client.status().await?);
    Ok(())
}

pub async fn progress(host: &str, config: ClientConfig) -> Result<()> {
    let mut client = connect(host, config).await?;
    print_lines(&client.progress().await?);
    Ok(())
}

pub async fn list_files(host: &str, config: ClientConfig) -> Result<()> {
    let mut client = connect(host, config).await?;
    print_lines(&client.list_files().await?);
    Ok(())
}

pub async fn get_image(
    host: &str,
    config: ClientConfig,
    image: &str,
    output: Option<&Path>,
) -> Result<()> {
    let mut client = connect(host, config).await?;
    let png = client.get_image(image).await?;
    match output {
        Some(path) => {
            tokio::fs::write(path, &png)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), bytes = png.len(), "preview saved");
        }
        None => {
            let path = viewer::save_temp_png(&png)?;
            viewer::open(&path)?;
        }
    }
    Ok(())
}

pub async fn send(host: &str, config: ClientConfig, file: &Path, print_after: bool) -> Result<()> {
    let mut client = connect(host, config).await?;
    let outcome = client
        .upload_file(file, print_after, report_upload)
        .await
        .with_context(|| format!("sending {}", file.display()))?;
    println!();
    println!("Finished transfer");

    print_lines(&outcome.close_reply);
    if let Some(reply) = &outcome.print_reply {
        print_lines(reply);
    }
    Ok(())
}

fn report_upload(event: UploadEvent<'_>) {
    match event {
        UploadEvent::Opened(lines) => print_lines(lines),
        UploadEvent::Progress(progress) => {
            print!("\rProgress: {:.1} %", progress.percent());
            let _ = std::io::stdout().flush();
        }
    }
}

pub async fn print(host: &str, config: ClientConfig, file: &str) -> Result<()> {
    let mut client = connect(host, config).await?;
    print_lines(&client.print_file(file).await?);
    Ok(())
}

pub async fn pause(host: &str, config: ClientConfig) -> Result<()> {
    let mut client = connect(host, config).await?;
    print_lines(&client.pause().await?);
    Ok(())
}

pub async fn resume(host: &str, config: ClientConfig) -> Result<()> {
    let mut client = connect(host, config).await?;
    print_lines(&client.resume().await?);
    Ok(())
}

pub async fn info(host: &str, config: ClientConfig) -> Result<()> {
    let mut client = connect(host, config).await?;
    print_lines(&client.info().await?);
    Ok(())
}

pub async fn control(host: &str, config: ClientConfig) -> Result<()> {
    let mut client = connect(host, config).await?;
    print_lines(&client.request_control().await?);
    Ok(())
}
