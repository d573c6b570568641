//! `request` subcommand.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use safe_fetch::{JsonReply, JsonRequest, ParseResult, RequestBody, SafeHttpClient, parse};
use tracing::warn;

use super::exit_code;
use crate::cli::RequestArgs;

pub async fn run(client: &SafeHttpClient, args: RequestArgs) -> Result<ExitCode> {
    let body = match (args.json, args.text) {
        (Some(json), _) => match parse(&json) {
            ParseResult::Parsed(value) => RequestBody::Json(value),
            ParseResult::Failed(failure) => bail!("--json is not valid JSON: {failure}"),
        },
        (None, Some(text)) => RequestBody::Text(text),
        (None, None) if !args.form.is_empty() => RequestBody::Form(args.form),
        (None, None) => RequestBody::Empty,
    };

    let mut request = JsonRequest::new(args.method).body(body);
    request.headers = args.headers;
    request.timeout = args.timeout_ms.map(Duration::from_millis);

    let reply = client
        .request_json(&args.url, request)
        .await
        .with_context(|| format!("Cannot request '{}'", args.url))?;

    println!("{}", serde_json::to_string_pretty(&reply.summary())?);
    if let JsonReply::Received(response) = &reply
        && !response.http_ok
        && let Some(message) = response.server_message()
    {
        warn!(status = response.status, "Server reported: {message}");
    }
    if let Some(failure) = reply.failure() {
        eprintln!("Error: {failure}");
    }
    Ok(exit_code(reply.is_success()))
}
