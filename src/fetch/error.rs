//! Error types for the fetch module.
//!
//! Two families live here. [`UsageError`] is the only thing the client ever
//! returns as `Err`: it signals a programmer mistake (bad URL, bad header,
//! zero timeout) detected before any I/O. [`FetchFailure`] is the taxonomy
//! of things that go wrong *during* a request; it is carried inside outcomes
//! and replies as an ordinary value.

use thiserror::Error;

/// Invalid arguments passed to the client.
#[derive(Debug, Error)]
pub enum UsageError {
    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// The URL parsed but does not use http or https.
    #[error("unsupported URL scheme '{scheme}' in {url} (expected http or https)")]
    UnsupportedScheme {
        /// The rejected URL string.
        url: String,
        /// The scheme that was found.
        scheme: String,
    },

    /// A header name or value is not valid HTTP.
    #[error("invalid header {name:?}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// The HTTP method name is not supported.
    #[error("unsupported HTTP method {method:?}")]
    UnsupportedMethod {
        /// The rejected method name.
        method: String,
    },

    /// A timeout of zero was requested.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    /// A configuration value is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The request body could not be encoded.
    #[error("request body could not be encoded: {message}")]
    InvalidBody {
        /// Encoder diagnostic.
        message: String,
    },

    /// Requests were started outside a tokio runtime.
    #[error("no tokio runtime is running; requests must be started from within one")]
    NoRuntime,

    /// The HTTP transport could not be constructed.
    #[error("failed to build HTTP transport: {message}")]
    TransportSetup {
        /// Builder diagnostic.
        message: String,
    },
}

impl UsageError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// Creates an invalid config error.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// What went wrong during a request.
///
/// `NetworkError`, `TimedOut` and `Cancelled` are terminal; nothing in this
/// crate retries them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// No terminal state was reached within the timeout.
    #[error("request timed out")]
    TimedOut,

    /// The caller cancelled the request.
    #[error("request was cancelled")]
    Cancelled,

    /// The transport failed (DNS, connection, TLS, or a broken body stream).
    #[error("network error: {message}")]
    NetworkError {
        /// Transport diagnostic.
        message: String,
    },

    /// The server answered with a status outside 2xx.
    #[error("HTTP error {status}")]
    HttpError {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not valid JSON.
    #[error("response body is not valid JSON: {message}")]
    ParseError {
        /// Decoder diagnostic.
        message: String,
    },
}

impl FetchFailure {
    /// Returns the HTTP status carried by an `HttpError`.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_invalid_url_display() {
        let error = UsageError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_usage_error_unsupported_scheme_display() {
        let error = UsageError::UnsupportedScheme {
            url: "ftp://example.com/file".to_string(),
            scheme: "ftp".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("'ftp'"), "Expected scheme in: {msg}");
        assert!(msg.contains("http or https"), "Expected hint in: {msg}");
    }

    #[test]
    fn test_usage_error_invalid_config_names_field() {
        let error = UsageError::invalid_config("request_timeout", "must be at least 1 ms");
        let msg = error.to_string();
        assert!(msg.contains("`request_timeout`"), "Expected field in: {msg}");
        assert!(msg.contains("at least 1 ms"), "Expected reason in: {msg}");
    }

    #[test]
    fn test_fetch_failure_http_error_carries_status() {
        let failure = FetchFailure::HttpError { status: 404 };
        assert_eq!(failure.status(), Some(404));
        assert!(failure.to_string().contains("404"));
    }

    #[test]
    fn test_fetch_failure_status_absent_for_other_variants() {
        assert_eq!(FetchFailure::TimedOut.status(), None);
        assert_eq!(FetchFailure::Cancelled.status(), None);
        assert_eq!(
            FetchFailure::NetworkError {
                message: "connection refused".to_string()
            }
            .status(),
            None
        );
    }

    #[test]
    fn test_fetch_failure_parse_error_display() {
        let failure = FetchFailure::ParseError {
            message: "expected value at line 1 column 1".to_string(),
        };
        let msg = failure.to_string();
        assert!(msg.contains("not valid JSON"), "Expected category in: {msg}");
        assert!(msg.contains("line 1 column 1"), "Expected detail in: {msg}");
    }
}
