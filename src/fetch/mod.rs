//! HTTP requests with explicit outcomes.
//!
//! This module provides [`SafeHttpClient`] and the types its requests report
//! through:
//! - Timed, cancellable GET ([`SafeHttpClient::get`])
//! - Progress-tracked download ([`SafeHttpClient::download`])
//! - JSON-body requests with safe decoding ([`SafeHttpClient::request_json`])
//!
//! GET and download return a [`RequestHandle`] immediately. The request runs
//! on its own tokio task and ends in exactly one [`Outcome`]; no
//! [`ProgressEvent`] is ever delivered after it.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use safe_fetch::fetch::{Outcome, SafeHttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SafeHttpClient::new()?;
//! let handle = client.get("https://httpbin.org/delay/5", Duration::from_millis(3_000))?;
//! match handle.outcome().await {
//!     Outcome::Completed { status, payload } => println!("Completed: {status}\n{payload}"),
//!     Outcome::TimedOut => println!("Timed out"),
//!     other => println!("{other}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
pub mod error;
mod handle;
mod json;
mod outcome;
mod progress;
pub mod transport;

pub use client::{DownloadOptions, GetOptions, SafeHttpClient};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BODY_PREFIX_CHARS, DEFAULT_REQUEST_TIMEOUT_MS,
    MAX_BODY_PREFIX_CHARS, MAX_TIMEOUT_SECS,
};
pub use error::{FetchFailure, UsageError};
pub use handle::{Canceller, RequestHandle, RequestId};
pub use json::{JsonReply, JsonRequest, JsonResponse, RequestBody};
pub use outcome::{DownloadOutcome, FetchEvent, Outcome, RequestState, TextOutcome};
pub use progress::ProgressEvent;
pub use transport::{HttpMethod, ReqwestTransport, Transport};
