//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use safe_fetch::HttpMethod;

/// Fetch URLs with timeouts, cancellation and safe JSON decoding.
///
/// Every request ends in exactly one reported outcome: completed, timed out,
/// cancelled, network error or HTTP error. Malformed JSON is reported, never
/// fatal.
#[derive(Parser, Debug)]
#[command(name = "safe-fetch")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/safe-fetch/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// TCP/TLS connect timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Safe-parse JSON text and print the value or the error
    Parse(ParseArgs),
    /// Timed GET; prints the status and the start of the body (Ctrl-C cancels)
    Get(GetArgs),
    /// Download with a progress bar (Ctrl-C cancels)
    Download(DownloadArgs),
    /// Send a request with an optional JSON or form body and decode the reply
    Request(RequestArgs),
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// JSON text (read from stdin when omitted)
    #[arg(conflicts_with = "examples")]
    pub text: Option<String>,

    /// Run the built-in malformed samples instead of parsing input
    #[arg(long)]
    pub examples: bool,

    /// Print the `{ok, data|error}` envelope instead of the bare value
    #[arg(long)]
    pub envelope: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// URL to fetch (http or https)
    pub url: String,

    /// Overall timeout in milliseconds (default from config, else 3000)
    #[arg(short = 't', long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..=3_600_000))]
    pub timeout_ms: Option<u64>,

    /// Characters of body text to print (default from config, else 200)
    #[arg(long, value_name = "N")]
    pub prefix_chars: Option<usize>,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// URL to download (http or https)
    pub url: String,

    /// Write the downloaded bytes to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overall timeout in milliseconds (no timeout by default)
    #[arg(short = 't', long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..=3_600_000))]
    pub timeout_ms: Option<u64>,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD)
    #[arg(value_parser = parse_method)]
    pub method: HttpMethod,

    /// URL to call (http or https)
    pub url: String,

    /// JSON request body
    #[arg(long, value_name = "JSON", conflicts_with_all = ["form", "text"])]
    pub json: Option<String>,

    /// Plain-text request body
    #[arg(long, value_name = "TEXT", conflicts_with = "form")]
    pub text: Option<String>,

    /// Form field sent URL-encoded, as key=value (repeatable)
    #[arg(long = "form", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub form: Vec<(String, String)>,

    /// Overall timeout in milliseconds (none by default)
    #[arg(short = 't', long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..=3_600_000))]
    pub timeout_ms: Option<u64>,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(format!("expected \"Name: value\", got {raw:?}"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("header name cannot be empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(format!("expected key=value, got {raw:?}"));
    };
    if key.is_empty() {
        return Err("form field name cannot be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_method(raw: &str) -> Result<HttpMethod, String> {
    raw.parse().map_err(|e: safe_fetch::UsageError| e.to_string())
}
