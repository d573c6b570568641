//! Client configuration.

use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::fetch::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BODY_PREFIX_CHARS, DEFAULT_REQUEST_TIMEOUT_MS,
    MAX_BODY_PREFIX_CHARS, MAX_TIMEOUT_SECS,
};
use crate::fetch::error::UsageError;
use crate::user_agent::default_user_agent;

/// Settings shared by every request issued through a `SafeHttpClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    connect_timeout: Duration,
    request_timeout: Duration,
    body_prefix_chars: usize,
    user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            body_prefix_chars: DEFAULT_BODY_PREFIX_CHARS,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Sets the TCP/TLS connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the default overall timeout for `get`.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets how many characters of a GET body are kept in the outcome.
    #[must_use]
    pub fn with_body_prefix_chars(mut self, chars: usize) -> Self {
        self.body_prefix_chars = chars;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn body_prefix_chars(&self) -> usize {
        self.body_prefix_chars
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), UsageError> {
        let max = Duration::from_secs(MAX_TIMEOUT_SECS);

        if self.connect_timeout < Duration::from_secs(1) || self.connect_timeout > max {
            return Err(UsageError::invalid_config(
                "connect_timeout",
                format!("must be between 1 and {MAX_TIMEOUT_SECS} seconds"),
            ));
        }
        if self.request_timeout < Duration::from_millis(1) || self.request_timeout > max {
            return Err(UsageError::invalid_config(
                "request_timeout",
                format!("must be between 1 ms and {MAX_TIMEOUT_SECS} seconds"),
            ));
        }
        if self.body_prefix_chars > MAX_BODY_PREFIX_CHARS {
            return Err(UsageError::invalid_config(
                "body_prefix_chars",
                format!("must be at most {MAX_BODY_PREFIX_CHARS}"),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(UsageError::invalid_config("user_agent", "cannot be empty"));
        }
        if HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(UsageError::invalid_config(
                "user_agent",
                "contains characters not allowed in an HTTP header",
            ));
        }
        Ok(())
    }
}
