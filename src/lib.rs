//! Safe Fetch Core Library
//!
//! Issue HTTP requests, enforce a timeout and cancellation policy, decode
//! response bodies as JSON without panicking, and report a structured result
//! to the caller.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parse`] - Safe JSON decoding into a tagged [`ParseResult`]
//! - [`fetch`] - [`SafeHttpClient`], request handles, outcomes and progress
//! - [`config`] - Client-wide settings ([`ClientConfig`])

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod fetch;
pub mod parse;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::ClientConfig;
pub use fetch::{
    Canceller, DownloadOptions, DownloadOutcome, FetchEvent, FetchFailure, GetOptions,
    HttpMethod, JsonReply, JsonRequest, JsonResponse, Outcome, ProgressEvent, RequestBody,
    RequestHandle, RequestId, RequestState, SafeHttpClient, TextOutcome, Transport, UsageError,
};
pub use parse::{ParseFailure, ParseFailureKind, ParseResult, parse, parse_as};
