//! Transport boundary: the HTTP capability the client is built on.
//!
//! The client never talks to the network directly. It describes each request
//! as a [`TransportRequest`] and hands it to a [`Transport`], which returns
//! the status line, headers and a body byte stream. Dropping the future
//! returned by [`Transport::send`], or the body stream, aborts the transfer;
//! that is how timeouts and cancellation reach the wire.
//!
//! [`ReqwestTransport`] is the production implementation. Tests inject their
//! own doubles.

mod reqwest_transport;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use thiserror::Error;
use url::Url;

use super::error::UsageError;

pub use reqwest_transport::ReqwestTransport;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Returns the canonical upper-case method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UsageError::UnsupportedMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl TransportRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Returns true if a header with `name` (case-insensitive) is present.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

/// Stream of body chunks, in arrival order.
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Status line, headers and body of a received response.
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Declared body length, when the server advertised one.
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl TransportResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request failed before a status line was received (DNS,
    /// connection refused, TLS, connect timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The response body stream broke after the status line arrived.
    #[error("response body interrupted: {0}")]
    Body(String),
}

/// An HTTP client capability.
///
/// Implementations must abort the transfer when the returned future, or the
/// body stream it yields, is dropped.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Issues `request` and resolves once the status line and headers arrive.
    async fn send(&self, request: TransportRequest)
    -> Result<TransportResponse, TransportError>;
}

/// Reads a body stream to the end.
///
/// # Errors
///
/// Returns the first [`TransportError`] yielded by the stream.
pub async fn collect_body(mut body: BodyStream) -> Result<Bytes, TransportError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer.freeze())
}

/// Reads a body stream to the end, keeping only its first `limit` bytes.
///
/// The rest of the stream is still consumed, so a failure anywhere in the
/// body is reported.
///
/// # Errors
///
/// Returns the first [`TransportError`] yielded by the stream.
pub async fn collect_body_prefix(
    mut body: BodyStream,
    limit: usize,
) -> Result<Bytes, TransportError> {
    let mut buffer = BytesMut::with_capacity(limit.min(8 * 1024));
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        let room = limit.saturating_sub(buffer.len()).min(chunk.len());
        buffer.extend_from_slice(&chunk[..room]);
    }
    Ok(buffer.freeze())
}
