// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ffctl: command-line control for FlashForge network printers.
//
// Entry point. Parses arguments, initialises logging, loads configuration and
// runs one subcommand against one printer connection.

mod commands;
mod viewer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ffctl_core::config::{ClientConfig, default_config_path};
use ffctl_core::error::FfError;
use ffctl_core::human_errors::humanize_error;

#[derive(Debug, Parser)]
#[command(name = "ffctl", version, about = "Control a FlashForge printer over the network")]
struct Cli {
    /// Increase log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file [default: $XDG_CONFIG_HOME/ffctl/config.json].
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Per-operation network timeout in seconds.
    #[arg(long, value_name = "SECS", global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan the local network for printers.
    Scan,

    /// Get status from the printer.
    Status {
        /// Host to connect to (IP[:port]).
        host: String,
    },

    /// Display print progress.
    Progress {
        /// Host to connect to (IP[:port]).
        host: String,
    },

    /// List files stored on the printer.
    #[command(visible_alias = "listfiles")]
    ListFiles {
        /// Host to connect to (IP[:port]).
        host: String,
    },

    /// Fetch the preview image for a stored file.
    ///
    /// Without `--output` the image is opened in the system viewer.
    #[command(visible_alias = "getimage")]
    GetImage {
        /// Host to connect to (IP[:port]).
        host: String,
        /// Image path on the printer.
        image: String,
        /// Write the PNG here instead of opening it.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Send a G-code file to the printer.
    Send {
        /// Host to connect to (IP[:port]).
        host: String,
        /// G-code file to send.
        file: PathBuf,
        /// Print the file once the upload completes.
        #[arg(long)]
        print: bool,
    },

    /// Print a file already stored on the printer.
    Print {
        /// Host to connect to (IP[:port]).
        host: String,
        /// File path; relative names are looked up under /user/.
        file: String,
    },

    /// Pause the current print.
    Pause {
        /// Host to connect to (IP[:port]).
        host: String,
    },

    /// Resume a paused print.
    Resume {
        /// Host to connect to (IP[:port]).
        host: String,
    },

    /// Show machine and firmware information.
    Info {
        /// Host to connect to (IP[:port]).
        host: String,
    },

    /// Request control of the printer for this session.
    Control {
        /// Host to connect to (IP[:port]).
        host: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = cli.dispatch().await {
        report(&e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins when set; otherwise the level follows `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn report(e: &anyhow::Error) {
    eprintln!("ffctl: {e:#}");
    if let Some(err) = e.chain().find_map(|c| c.downcast_ref::<FfError>()) {
        let human = humanize_error(err);
        eprintln!("  {}", human.message);
        eprintln!("  hint: {}", human.suggestion);
    }
}

impl Cli {
    fn load_config(&self) -> Result<ClientConfig> {
        let path = self.config.clone().unwrap_or_else(default_config_path);
        let mut config = ClientConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?;
        if let Some(secs) = self.timeout {
            config.io_timeout_secs = Some(secs);
        }
        config.validate()?;
        tracing::debug!(config = ?config, "configuration loaded");
        Ok(config)
    }

    async fn dispatch(self) -> Result<()> {
        let config = self.load_config()?;
        match self.command {
            Command::Scan => commands::scan(&config).await,
            Command::Status { host } => commands::status(&host, config).await,
            Command::Progress { host } => commands::progress(&host, config).await,
            Command::ListFiles { host } => commands::list_files(&host, config).await,
            Command::GetImage {
                host,
                image,
                output,
            } => commands::get_image(&host, config, &image, output.as_deref()).await,
            Command::Send { host, file, print } => {
                commands::send(&host, config, &file, print).await
            }
            Command::Print { host, file } => commands::print(&host, config, &file).await,
            Command::Pause { host } => commands::pause(&host, config).await,
            Command::Resume { host } => commands::resume(&host, config).await,
            Command::Info { host } => commands::info(&host, config).await,
            Command::Control { host } => commands::control(&host, config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn legacy_aliases_still_parse() {
        let cli = Cli::try_parse_from(["ffctl", "listfiles", "10.0.0.5"]).unwrap();
        assert!(matches!(cli.command, Command::ListFiles { host } if host == "10.0.0.5"));

        let cli = Cli::try_parse_from(["ffctl", "getimage", "10.0.0.5", "/data/a.gx"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::GetImage { ref image, output: None, .. } if image == "/data/a.gx"
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["ffctl", "send", "printer:8899", "cube.gx", "--print", "-vv", "--timeout", "5"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.timeout, Some(5));
        match cli.command {
            Command::Send { host, file, print } => {
                assert_eq!(host, "printer:8899");
                assert_eq!(file, PathBuf::from("cube.gx"));
                assert!(print);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["ffctl", "--timeout", "0", "status", "h"]).is_err());
    }

    #[test]
    fn missing_host_is_rejected() {
        assert!(Cli::try_parse_from(["ffctl", "status"]).is_err());
        assert!(Cli::try_parse_from(["ffctl"]).is_err());
    }

    #[test]
    fn timeout_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "io_timeout_secs": 30, "default_port": 9000 }"#).unwrap();
        let path_arg = path.to_str().unwrap();

        let cli = Cli::try_parse_from(["ffctl", "--config", path_arg, "--timeout", "3", "scan"])
            .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.io_timeout_secs, Some(3));
        assert_eq!(config.default_port, 9000);
    }
}
