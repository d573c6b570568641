//! `reqwest`-backed transport.

use std::error::Error as _;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Method};
use tracing::{debug, instrument};

use super::{HttpMethod, Transport, TransportError, TransportRequest, TransportResponse};
use crate::config::ClientConfig;
use crate::fetch::error::UsageError;

/// Transport that issues requests through a pooled [`reqwest::Client`].
///
/// Build it once and share it; connections are reused across requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport from the client configuration.
    ///
    /// Only the connect timeout is applied at this level. Overall request
    /// timeouts are enforced by the request lifecycle so they can be reported
    /// as `TimedOut` rather than as a network error.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::TransportSetup`] if the client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, UsageError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .gzip(true)
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| UsageError::TransportSetup {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(level = "debug", skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(describe(&e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let content_length = response.content_length();
        debug!(status, ?content_length, "response headers received");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Body(describe(&e))))
            .boxed();

        Ok(TransportResponse {
            status,
            headers,
            content_length,
            body,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Flattens a reqwest error and its source chain into one line.
///
/// reqwest's own message ("error sending request for url ...") hides the
/// useful part ("connection refused") in the source chain.
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fetch::transport::collect_body;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use url::Url;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_method_mapping_covers_all_variants() {
        assert_eq!(to_reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(to_reqwest_method(HttpMethod::Head), Method::HEAD);
        assert_eq!(to_reqwest_method(HttpMethod::Post), Method::POST);
        assert_eq!(to_reqwest_method(HttpMethod::Put), Method::PUT);
        assert_eq!(to_reqwest_method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(to_reqwest_method(HttpMethod::Delete), Method::DELETE);
    }

    #[tokio::test]
    async fn test_send_returns_status_headers_and_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/productos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Origen", "mock")
                    .set_body_string("[]"),
            )
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/productos", mock_server.uri())).unwrap();
        let response = transport()
            .send(TransportRequest::new(HttpMethod::Get, url))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_length, Some(2));
        assert!(
            response
                .headers
                .iter()
                .any(|(name, value)| name == "x-origen" && value == "mock")
        );
        assert_eq!(collect_body(response.body).await.unwrap().as_ref(), b"[]");
    }

    #[tokio::test]
    async fn test_send_forwards_headers_and_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(path("/carrito"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"cantidad":1}"#))
            .respond_with(ResponseTemplate::new(201))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/carrito", mock_server.uri())).unwrap();
        let mut request = TransportRequest::new(HttpMethod::Post, url);
        request
            .headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        request.body = Some(bytes::Bytes::from_static(br#"{"cantidad":1}"#));

        let response = transport().send(request).await.unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_send_connection_refused_is_request_error() {
        // Bind then drop a listener to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let err = transport()
            .send(TransportRequest::new(HttpMethod::Get, url))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Request(_)), "got {err:?}");
    }
}
