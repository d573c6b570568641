//! `SafeHttpClient`: timed GET, progress-tracked download and JSON requests.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::MAX_PREALLOCATED_BYTES;
use super::error::UsageError;
use super::handle::{RequestHandle, spawn_lifecycle};
use super::json::{JSON_CONTENT_TYPE, JsonReply, JsonRequest, JsonResponse, RequestBody};
use super::outcome::Outcome;
use super::progress::ProgressEvent;
use super::transport::{
    HttpMethod, ReqwestTransport, Transport, TransportError, TransportRequest, collect_body,
    collect_body_prefix,
};
use crate::config::ClientConfig;

/// Per-call options for [`SafeHttpClient::get_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Overall deadline. Defaults to the client's request timeout.
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
    /// Characters of body text kept in the outcome. Defaults to the client's
    /// configured prefix length.
    pub prefix_chars: Option<usize>,
}

impl GetOptions {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn prefix_chars(mut self, chars: usize) -> Self {
        self.prefix_chars = Some(chars);
        self
    }
}

/// Per-call options for [`SafeHttpClient::download_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Overall deadline. Downloads have none by default.
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
}

impl DownloadOptions {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// HTTP client whose requests never fail by panicking or by `Err`.
///
/// Everything that can go wrong once a request is on its way is reported as
/// a value: an [`Outcome`] on the request's handle, or a [`JsonReply`]. The
/// only `Err` is [`UsageError`], raised before any I/O for arguments that
/// could never work.
///
/// The client is cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct SafeHttpClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl SafeHttpClient {
    /// Creates a client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::TransportSetup`] if the HTTP stack cannot be
    /// initialized.
    pub fn new() -> Result<Self, UsageError> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client backed by reqwest.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::InvalidConfig`] if `config` fails validation, or
    /// [`UsageError::TransportSetup`] if the HTTP stack cannot be initialized.
    pub fn with_config(config: ClientConfig) -> Result<Self, UsageError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            config,
        })
    }

    /// Creates a client over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::InvalidConfig`] if `config` fails validation.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> Result<Self, UsageError> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Starts a timed GET.
    ///
    /// The request is already running when this returns. Its single outcome
    /// is `Completed` with the status and body prefix (any status, 4xx and
    /// 5xx included), `TimedOut`, `Cancelled` or `NetworkError`.
    ///
    /// The whole body is read before completing, but only the bytes that can
    /// hold the prefix (four per character) are kept in memory.
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] for an invalid URL, a zero timeout, or when
    /// called outside a tokio runtime.
    pub fn get(&self, url: &str, timeout: Duration) -> Result<RequestHandle<String>, UsageError> {
        self.get_with(url, GetOptions::default().timeout(timeout))
    }

    /// Starts a timed GET with extra options.
    ///
    /// # Errors
    ///
    /// Same as [`SafeHttpClient::get`], plus invalid header names or values.
    #[instrument(skip(self, options), fields(url = %url))]
    pub fn get_with(
        &self,
        url: &str,
        options: GetOptions,
    ) -> Result<RequestHandle<String>, UsageError> {
        let timeout = nonzero_timeout(options.timeout.unwrap_or(self.config.request_timeout()))?;
        let prefix_chars = options
            .prefix_chars
            .unwrap_or(self.config.body_prefix_chars());
        let request = build_request(HttpMethod::Get, url, options.headers)?;
        let transport = Arc::clone(&self.transport);

        spawn_lifecycle(Some(timeout), move |reporter| async move {
            let response = match transport.send(request).await {
                Ok(response) => response,
                Err(error) => return network_error(&error),
            };
            let status = response.status;
            debug!(request_id = %reporter.id(), status, "response received");
            match collect_body_prefix(response.body, prefix_chars.saturating_mul(4)).await {
                Ok(body) => Outcome::Completed {
                    status,
                    payload: body_prefix(&body, prefix_chars),
                },
                Err(error) => network_error(&error),
            }
        })
    }

    /// Starts a download with progress events and no deadline.
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] for an invalid URL or when called outside a
    /// tokio runtime.
    pub fn download(&self, url: &str) -> Result<RequestHandle<Bytes>, UsageError> {
        self.download_with(url, DownloadOptions::default())
    }

    /// Starts a download with extra options.
    ///
    /// Emits one [`ProgressEvent`] per received chunk with cumulative byte
    /// counts, then the outcome. A non-2xx status ends the request with
    /// `HttpError` without reading the body.
    ///
    /// # Errors
    ///
    /// Same as [`SafeHttpClient::download`], plus invalid headers and a zero
    /// timeout.
    #[instrument(skip(self, options), fields(url = %url))]
    pub fn download_with(
        &self,
        url: &str,
        options: DownloadOptions,
    ) -> Result<RequestHandle<Bytes>, UsageError> {
        let timeout = options.timeout.map(nonzero_timeout).transpose()?;
        let request = build_request(HttpMethod::Get, url, options.headers)?;
        let transport = Arc::clone(&self.transport);

        spawn_lifecycle(timeout, move |reporter| async move {
            let response = match transport.send(request).await {
                Ok(response) => response,
                Err(error) => return network_error(&error),
            };
            if !response.is_success() {
                info!(request_id = %reporter.id(), status = response.status, "download rejected by server");
                return Outcome::HttpError {
                    status: response.status,
                };
            }

            let status = response.status;
            let total = response.content_length;
            let capacity = total.map_or(0, |total| {
                usize::try_from(total.min(MAX_PREALLOCATED_BYTES)).unwrap_or(0)
            });
            let mut buffer = BytesMut::with_capacity(capacity);
            let mut body = response.body;
            let mut loaded: u64 = 0;

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(error) => return network_error(&error),
                };
                if chunk.is_empty() {
                    continue;
                }
                loaded += chunk.len() as u64;
                buffer.extend_from_slice(&chunk);
                if !reporter.progress(ProgressEvent::new(loaded, total)) {
                    // Already settled; whatever is returned here is discarded.
                    return Outcome::Cancelled;
                }
            }

            debug!(request_id = %reporter.id(), bytes = loaded, "download complete");
            Outcome::Completed {
                status,
                payload: buffer.freeze(),
            }
        })
    }

    /// Sends a request and safe-parses the response body as JSON.
    ///
    /// `Accept: application/json` is added unless the caller set one, and the
    /// body's content type is added unless the caller set one.
    ///
    /// # Errors
    ///
    /// Only for unusable arguments: invalid URL or header, a body that cannot
    /// be encoded, or a zero timeout. Every received response, however
    /// malformed, is an `Ok`.
    #[instrument(skip(self, request), fields(url = %url, method = %request.method))]
    pub async fn request_json(
        &self,
        url: &str,
        request: JsonRequest,
    ) -> Result<JsonReply, UsageError> {
        let timeout = request.timeout.map(nonzero_timeout).transpose()?;
        let encoded = request.body.encode()?;
        let mut outgoing = build_request(request.method, url, request.headers)?;
        if !outgoing.has_header("accept") {
            outgoing
                .headers
                .push(("Accept".to_string(), JSON_CONTENT_TYPE.to_string()));
        }
        if let Some((content_type, bytes)) = encoded {
            if !outgoing.has_header("content-type") {
                outgoing
                    .headers
                    .push(("Content-Type".to_string(), content_type.to_string()));
            }
            outgoing.body = Some(bytes);
        }

        let exchange = async {
            let response = self.transport.send(outgoing).await?;
            let status = response.status;
            let headers = response.headers;
            let body = collect_body(response.body).await?;
            Ok::<_, TransportError>(JsonResponse::from_parts(status, headers, &body))
        };

        let result = match timeout {
            Some(timeout) => match tokio::time::timeout(timeout, exchange).await {
                Ok(result) => result,
                Err(_) => {
                    info!(?timeout, "JSON request timed out");
                    return Ok(JsonReply::TransportFailed {
                        message: format!("no response within {} ms", timeout.as_millis()),
                        timed_out: true,
                    });
                }
            },
            None => exchange.await,
        };

        Ok(match result {
            Ok(response) => {
                debug!(
                    status = response.status,
                    parsed = response.body.is_ok(),
                    "JSON response received"
                );
                JsonReply::Received(response)
            }
            Err(error) => {
                warn!(error = %error, "JSON request failed");
                JsonReply::TransportFailed {
                    message: error.to_string(),
                    timed_out: false,
                }
            }
        })
    }

    /// `GET` with `Accept: application/json`.
    ///
    /// # Errors
    ///
    /// See [`SafeHttpClient::request_json`].
    pub async fn get_json(&self, url: &str) -> Result<JsonReply, UsageError> {
        self.request_json(url, JsonRequest::new(HttpMethod::Get))
            .await
    }

    /// `POST` with `value` serialized as a JSON body.
    ///
    /// # Errors
    ///
    /// See [`SafeHttpClient::request_json`].
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        value: &T,
    ) -> Result<JsonReply, UsageError> {
        let body = RequestBody::json(value)?;
        self.request_json(url, JsonRequest::new(HttpMethod::Post).body(body))
            .await
    }

    /// `POST` with a URL-encoded form body.
    ///
    /// # Errors
    ///
    /// See [`SafeHttpClient::request_json`].
    pub async fn post_form<K, V, I>(&self, url: &str, fields: I) -> Result<JsonReply, UsageError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let body = RequestBody::form(fields);
        self.request_json(url, JsonRequest::new(HttpMethod::Post).body(body))
            .await
    }

    /// `DELETE` with `Accept: application/json`.
    ///
    /// # Errors
    ///
    /// See [`SafeHttpClient::request_json`].
    pub async fn delete_json(&self, url: &str) -> Result<JsonReply, UsageError> {
        self.request_json(url, JsonRequest::new(HttpMethod::Delete))
            .await
    }
}

/// Parses and checks a request URL. Only http and https are accepted.
pub(crate) fn parse_url(url: &str) -> Result<Url, UsageError> {
    let parsed = Url::parse(url).map_err(|_| UsageError::invalid_url(url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UsageError::UnsupportedScheme {
            url: url.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

fn validate_headers(headers: &[(String, String)]) -> Result<(), UsageError> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| UsageError::invalid_header(name))?;
        HeaderValue::from_str(value).map_err(|_| UsageError::invalid_header(name))?;
    }
    Ok(())
}

fn build_request(
    method: HttpMethod,
    url: &str,
    headers: Vec<(String, String)>,
) -> Result<TransportRequest, UsageError> {
    let url = parse_url(url)?;
    validate_headers(&headers)?;
    let mut request = TransportRequest::new(method, url);
    request.headers = headers;
    Ok(request)
}

fn nonzero_timeout(timeout: Duration) -> Result<Duration, UsageError> {
    if timeout.is_zero() {
        Err(UsageError::ZeroTimeout)
    } else {
        Ok(timeout)
    }
}

fn network_error<P>(error: &TransportError) -> Outcome<P> {
    Outcome::NetworkError {
        message: error.to_string(),
    }
}

/// First `chars` characters of `body`, decoded as lossy UTF-8.
fn body_prefix(body: &[u8], chars: usize) -> String {
    String::from_utf8_lossy(body).chars().take(chars).collect()
}
