//! Network transport abstraction.

use super::error::ApiError;
use super::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;

/// Sends a single resolved request and returns the raw response.
///
/// Transports report connectivity problems as [`ApiError::Network`]; status
/// handling, envelope decoding, timeouts and retries belong to
/// [`ApiClient`](super::ApiClient).
///
/// # Cancellation Safety
///
/// Implementations must be cancellation-safe: the client enforces its timeout
/// by dropping the returned future.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ticketboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// Wrap a preconfigured client (proxies, TLS roots, custom timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                ApiError::InvalidRequest(e.to_string())
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
