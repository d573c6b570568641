//! `download` subcommand.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use safe_fetch::{DownloadOptions, Outcome, ProgressEvent, SafeHttpClient};
use tracing::info;

use super::{cancel_on_ctrl_c, exit_code};
use crate::cli::DownloadArgs;

pub async fn run(client: &SafeHttpClient, args: DownloadArgs) -> Result<ExitCode> {
    let options = DownloadOptions {
        timeout: args.timeout_ms.map(Duration::from_millis),
        headers: args.headers,
    };
    let handle = client
        .download_with(&args.url, options)
        .with_context(|| format!("Cannot download '{}'", args.url))?;

    info!(request_id = %handle.id(), url = %args.url, "Download started");
    let interrupt = cancel_on_ctrl_c(handle.canceller());
    let bar = ProgressBar::new_spinner();
    bar.enable_steady_tick(Duration::from_millis(100));

    let outcome = handle
        .drive(|event| render_progress(&bar, event), |_| bar.finish_and_clear())
        .await;
    interrupt.abort();

    match &outcome {
        Outcome::Completed { status, payload } => {
            match &args.output {
                Some(path) => {
                    tokio::fs::write(path, payload)
                        .await
                        .with_context(|| format!("Failed to write '{}'", path.display()))?;
                    println!(
                        "Completed: {status} ({} bytes written to {})",
                        payload.len(),
                        path.display()
                    );
                }
                None => println!("Completed: {status} ({} bytes)", payload.len()),
            }
        }
        Outcome::TimedOut => println!("Timed out"),
        Outcome::Cancelled => println!("Cancelled"),
        Outcome::NetworkError { message } => println!("Network error: {message}"),
        Outcome::HttpError { status } => println!("HTTP error: {status}"),
    }
    Ok(exit_code(outcome.is_completed()))
}

fn render_progress(bar: &ProgressBar, event: &ProgressEvent) {
    match event.total_bytes {
        Some(total) if bar.length() != Some(total) => {
            bar.set_length(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
            );
        }
        _ => {}
    }
    bar.set_position(event.loaded_bytes);
    bar.set_message(event.to_string());
}
