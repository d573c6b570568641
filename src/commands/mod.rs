//! Subcommand dispatch.

use std::process::ExitCode;

use anyhow::{Context, Result};
use safe_fetch::{ClientConfig, SafeHttpClient};
use tokio::task::JoinHandle;
use tracing::info;

use crate::cli::Command;

mod download;
mod get;
mod parse;
mod request;

/// Runs one subcommand. A request that ends in anything but success exits
/// with code 1; usage and I/O errors surface as `Err`.
pub async fn run(command: Command, config: ClientConfig) -> Result<ExitCode> {
    match command {
        Command::Parse(args) => parse::run(&args),
        Command::Get(args) => get::run(&build_client(config)?, args).await,
        Command::Download(args) => download::run(&build_client(config)?, args).await,
        Command::Request(args) => request::run(&build_client(config)?, args).await,
    }
}

fn build_client(config: ClientConfig) -> Result<SafeHttpClient> {
    SafeHttpClient::with_config(config).context("Failed to create HTTP client")
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Cancels the request through `canceller` on the first Ctrl-C.
///
/// Abort the returned task once the request has settled.
fn cancel_on_ctrl_c(canceller: safe_fetch::Canceller) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && canceller.cancel() {
            info!(request_id = %canceller.id(), "Cancelled by user");
        }
    })
}
