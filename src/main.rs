//! CLI entry point for the safe-fetch tool.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use safe_fetch::ClientConfig;
use tracing::{debug, info};

mod app_config;
mod cli;
mod commands;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so stdout carries only command output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?cli, "CLI arguments parsed");

    let loaded = app_config::load_file_config_from(cli.config.as_deref())?;
    if loaded.loaded_from_file {
        info!(path = ?loaded.path, "Loaded config file");
    }

    let mut config = ClientConfig::default();
    if let Some(file_config) = &loaded.config {
        config = file_config.apply_to(config);
    }
    if let Some(secs) = cli.connect_timeout {
        config = config.with_connect_timeout(Duration::from_secs(secs));
    }
    config.validate().context("Invalid client configuration")?;

    commands::run(cli.command, config).await
}
