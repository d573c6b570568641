//! `get` subcommand.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use safe_fetch::{GetOptions, SafeHttpClient};
use tracing::info;

use super::{cancel_on_ctrl_c, exit_code};
use crate::cli::GetArgs;

pub async fn run(client: &SafeHttpClient, args: GetArgs) -> Result<ExitCode> {
    let options = GetOptions {
        timeout: args.timeout_ms.map(Duration::from_millis),
        headers: args.headers,
        prefix_chars: args.prefix_chars,
    };
    let handle = client
        .get_with(&args.url, options)
        .with_context(|| format!("Cannot request '{}'", args.url))?;

    info!(request_id = %handle.id(), url = %args.url, "Loading...");
    let interrupt = cancel_on_ctrl_c(handle.canceller());
    let outcome = handle.outcome().await;
    interrupt.abort();

    println!("{outcome}");
    Ok(exit_code(outcome.is_completed()))
}
