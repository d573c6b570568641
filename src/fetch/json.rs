//! JSON-body requests with safe decoding.
//!
//! A [`JsonReply`] keeps three failure modes apart:
//!
//! - transport failure: no response at all ([`JsonReply::TransportFailed`]);
//! - parse failure: a response arrived but its body is not JSON
//!   ([`JsonResponse::body`] is [`ParseResult::Failed`]);
//! - semantic failure: the body parsed but the status is outside 2xx
//!   ([`JsonResponse::http_ok`] is false).
//!
//! None of these is an `Err`. The body is always read in full as text and
//! run through [`crate::parse::parse`] before the status is looked at.

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::{FetchFailure, UsageError};
use super::transport::HttpMethod;
use crate::parse::{self, ParseResult};

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Body of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Sent as `application/json`.
    Json(Value),
    /// Sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Sent as `text/plain`.
    Text(String),
}

impl RequestBody {
    /// Serializes `value` into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::InvalidBody`] if `value` cannot be represented
    /// as JSON (for example a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, UsageError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| UsageError::InvalidBody {
                message: e.to_string(),
            })
    }

    /// Builds a form body from key/value pairs.
    pub fn form<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Encodes the body, returning its content type and bytes.
    pub(crate) fn encode(&self) -> Result<Option<(&'static str, Bytes)>, UsageError> {
        match self {
            Self::Empty => Ok(None),
            Self::Json(value) => serde_json::to_vec(value)
                .map(|bytes| Some((JSON_CONTENT_TYPE, Bytes::from(bytes))))
                .map_err(|e| UsageError::InvalidBody {
                    message: e.to_string(),
                }),
            Self::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                Ok(Some((FORM_CONTENT_TYPE, Bytes::from(encoded))))
            }
            Self::Text(text) => Ok(Some((TEXT_CONTENT_TYPE, Bytes::from(text.clone())))),
        }
    }
}

/// Parameters for [`super::SafeHttpClient::request_json`].
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// Overall deadline. `None` waits as long as the transport does.
    pub timeout: Option<Duration>,
}

impl Default for JsonRequest {
    fn default() -> Self {
        Self::new(HttpMethod::Get)
    }
}

impl JsonRequest {
    #[must_use]
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A received response whose body went through safe-parse.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: u16,
    /// True for 2xx statuses.
    pub http_ok: bool,
    pub headers: Vec<(String, String)>,
    pub body: ParseResult<Value>,
    raw: String,
}

impl JsonResponse {
    pub(crate) fn from_parts(status: u16, headers: Vec<(String, String)>, body: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(body).into_owned();
        Self {
            status,
            http_ok: (200..300).contains(&status),
            headers,
            body: parse::parse(&raw),
            raw,
        }
    }

    /// Classifies the response.
    ///
    /// A body that failed to parse wins over a bad status: the caller cannot
    /// trust anything the server said if it is not JSON.
    #[must_use]
    pub fn failure(&self) -> Option<FetchFailure> {
        if let Some(error) = self.body.error() {
            return Some(FetchFailure::ParseError {
                message: error.message.clone(),
            });
        }
        if !self.http_ok {
            return Some(FetchFailure::HttpError {
                status: self.status,
            });
        }
        None
    }

    /// Returns the decoded body, if it parsed.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.body.data()
    }

    /// Decodes the raw body into `T`.
    #[must_use]
    pub fn decode<T: DeserializeOwned>(&self) -> ParseResult<T> {
        parse::parse_as(&self.raw)
    }

    /// The body as received, lossily decoded as UTF-8.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Returns the first header value named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Extracts the server's own error detail from the body.
    ///
    /// Looks at `errors`, `error` and `message`, in that order. Strings are
    /// returned as-is; anything else is rendered as compact JSON.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        let object = self.data()?.as_object()?;
        ["errors", "error", "message"]
            .iter()
            .find_map(|key| object.get(*key))
            .filter(|value| !value.is_null())
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
    }

    /// A JSON summary: `ok` plus `data` or `error`, then `httpOk` and `status`.
    #[must_use]
    pub fn summary(&self) -> Value {
        let mut summary = Map::new();
        match &self.body {
            ParseResult::Parsed(data) => {
                summary.insert("ok".to_string(), Value::Bool(true));
                summary.insert("data".to_string(), data.clone());
            }
            ParseResult::Failed(failure) => {
                summary.insert("ok".to_string(), Value::Bool(false));
                summary.insert("error".to_string(), Value::String(failure.message.clone()));
            }
        }
        summary.insert("httpOk".to_string(), Value::Bool(self.http_ok));
        summary.insert("status".to_string(), Value::from(self.status));
        Value::Object(summary)
    }
}

/// Result of a JSON-body request.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonReply {
    /// A response arrived; see [`JsonResponse`] for parse and status checks.
    Received(JsonResponse),
    /// No response was received.
    TransportFailed {
        message: String,
        /// True when the overall timeout elapsed first.
        timed_out: bool,
    },
}

impl JsonReply {
    #[must_use]
    pub fn failure(&self) -> Option<FetchFailure> {
        match self {
            Self::Received(response) => response.failure(),
            Self::TransportFailed {
                timed_out: true, ..
            } => Some(FetchFailure::TimedOut),
            Self::TransportFailed { message, .. } => Some(FetchFailure::NetworkError {
                message: message.clone(),
            }),
        }
    }

    /// True when the body parsed and the status was 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    #[must_use]
    pub fn response(&self) -> Option<&JsonResponse> {
        match self {
            Self::Received(response) => Some(response),
            Self::TransportFailed { .. } => None,
        }
    }

    #[must_use]
    pub fn into_response(self) -> Option<JsonResponse> {
        match self {
            Self::Received(response) => Some(response),
            Self::TransportFailed { .. } => None,
        }
    }

    /// JSON summary of the reply. Transport failures report
    /// `transportFailed` and `timedOut` instead of a status.
    #[must_use]
    pub fn summary(&self) -> Value {
        match self {
            Self::Received(response) => response.summary(),
            Self::TransportFailed { message, timed_out } => {
                let mut summary = Map::new();
                summary.insert("ok".to_string(), Value::Bool(false));
                summary.insert("error".to_string(), Value::String(message.clone()));
                summary.insert("transportFailed".to_string(), Value::Bool(true));
                summary.insert("timedOut".to_string(), Value::Bool(*timed_out));
                Value::Object(summary)
            }
        }
    }
}
