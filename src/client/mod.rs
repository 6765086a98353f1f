//! Ticketing API client with response caching and retries.
//!
//! [`ApiClient::request`] resolves an endpoint against the configured base URL,
//! answers GETs from an in-memory TTL cache when possible, bounds each network
//! attempt by a timeout and retries failures with exponential backoff. Every
//! attempt and every cache hit is recorded in the shared [`RequestMonitor`].
//!
//! # Example
//!
//! ```no_run
//! use ticketboard::client::{ApiClient, RequestOptions};
//! use ticketboard::config::DashboardConfig;
//!
//! # async fn example() -> Result<(), ticketboard::client::ApiError> {
//! let client = ApiClient::new(&DashboardConfig::default())?;
//! client.set_auth_token("glpi-session-token");
//!
//! let fetched = client
//!     .request::<serde_json::Value>("/tickets/count", RequestOptions::get())
//!     .await?;
//! println!("from cache: {}", fetched.from_cache);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

pub use cache::{cache_key, CacheEntry, ResponseCache};
pub use error::ApiError;
pub use retry::RetryPolicy;
pub use transport::{ReqwestTransport, Transport};
pub use types::{ApiResponse, Fetched, HttpRequest, HttpResponse, Method, RequestOptions};

use crate::config::DashboardConfig;
use crate::monitor::RequestMonitor;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

const AUTHORIZATION: &str = "Authorization";

/// HTTP client for the ticketing API.
///
/// Constructed explicitly and shared by reference (usually behind an `Arc`);
/// there is no process-wide instance.
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    cache: Mutex<ResponseCache>,
    cache_enabled: AtomicBool,
    retry: RetryPolicy,
    timeout: Duration,
    default_headers: RwLock<BTreeMap<String, String>>,
    monitor: Arc<RequestMonitor>,
}

impl ApiClient {
    /// Create a client that talks to the network through `reqwest`.
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        Ok(Self::with_transport(
            config,
            Arc::new(ReqwestTransport::new()?),
        ))
    }

    /// Create a client with a custom transport (for testing).
    pub fn with_transport(config: &DashboardConfig, transport: Arc<dyn Transport>) -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        Self {
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            transport,
            cache: Mutex::new(ResponseCache::new(
                Duration::from_secs(config.cache.ttl_seconds),
                config.cache.max_size,
            )),
            cache_enabled: AtomicBool::new(config.cache.enabled),
            retry: RetryPolicy::from(&config.retry),
            timeout: Duration::from_millis(config.api.timeout_ms),
            default_headers: RwLock::new(default_headers),
            monitor: Arc::new(RequestMonitor::new(&config.monitor)),
        }
    }

    /// Replace the default retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn monitor(&self) -> &Arc<RequestMonitor> {
        &self.monitor
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `Authorization: Bearer <token>` with every subsequent request.
    pub fn set_auth_token(&self, token: impl Into<String>) {
        let value = format!("Bearer {}", token.into());
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(AUTHORIZATION.to_string(), value);
        tracing::debug!("Auth token set");
    }

    pub fn clear_auth_token(&self) {
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(AUTHORIZATION);
        tracing::debug!("Auth token cleared");
    }

    pub fn has_auth_token(&self) -> bool {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(AUTHORIZATION)
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled.load(Ordering::SeqCst)
    }

    /// Toggle response caching. Disabling also drops every cached entry.
    pub fn set_cache_enabled(&self, enabled: bool) {
        self.cache_enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.clear_cache();
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache().len()
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    /// Drop cached responses whose URL contains `fragment`.
    pub fn invalidate(&self, fragment: &str) -> usize {
        let removed = self.cache().remove_matching(fragment);
        tracing::debug!(fragment, removed, "Invalidated cached responses");
        removed
    }

    /// Release cached data, credentials and telemetry.
    pub fn dispose(&self) {
        self.clear_cache();
        self.clear_auth_token();
        self.monitor.clear();
    }

    /// Resolve an endpoint (absolute URL or path) against the base URL.
    pub fn url_for(&self, endpoint: &str, query: &[(String, String)]) -> Result<String, ApiError> {
        let joined = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        };
        if query.is_empty() {
            return Ok(joined);
        }

        let mut url = reqwest::Url::parse(&joined)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid URL '{}': {}", joined, e)))?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url.to_string())
    }

    /// Issue a request and decode the `{ data, success }` envelope into `T`.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt once retries are exhausted:
    /// - `ApiError::Status` for non-2xx responses
    /// - `ApiError::Network` / `ApiError::Timeout` for transport failures
    /// - `ApiError::Decode` if the body isn't a valid envelope for `T`
    pub async fn request<T>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Fetched<ApiResponse<T>>, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(endpoint, &options.query)?;
        let body = options.body.as_ref().map(|b| b.to_string());
        let key = cache_key(options.method, &url, body.as_deref());
        let use_cache = options.method == Method::Get && self.cache_enabled();

        if use_cache {
            let cached = self.cache().get(&key);
            if let Some(raw) = cached {
                self.monitor.record_cache_hit(options.method, endpoint);
                metrics::counter!("ticketboard_cache_hits_total").increment(1);
                tracing::debug!(endpoint, "Serving response from cache");
                let response = ApiResponse::<T>::deserialize(&raw)
                    .map_err(|e| ApiError::Decode(format!("Cached response mismatch: {}", e)))?;
                return Ok(Fetched {
                    data: response,
                    from_cache: true,
                });
            }
            metrics::counter!("ticketboard_cache_misses_total").increment(1);
        }
        let ticket = use_cache.then(|| self.cache().issue());

        let mut headers = self
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        headers.extend(options.headers);

        let request = HttpRequest {
            method: options.method,
            url,
            headers,
            body,
        };
        let timeout = options.timeout.unwrap_or(self.timeout);
        let policy = match options.retries {
            Some(retries) => self.retry.clone().with_max_retries(retries),
            None => self.retry.clone(),
        };

        let mut attempt = 0;
        loop {
            match self.attempt::<T>(&request, endpoint, attempt, timeout).await {
                Ok((raw, response)) => {
                    if let (Some(ticket), true) = (ticket, response.success) {
                        self.cache().insert_issued(key, raw, ticket);
                    }
                    return Ok(Fetched {
                        data: response,
                        from_cache: false,
                    });
                }
                Err(error) if policy.should_retry(attempt) => {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        endpoint,
                        attempt,
                        error = %error,
                        error_kind = error.kind(),
                        retry_in_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    tracing::error!(
                        endpoint,
                        attempts = attempt + 1,
                        error = %error,
                        error_kind = error.kind(),
                        "Request failed, retries exhausted"
                    );
                    return Err(error);
                }
            }
        }
    }

    /// GET `endpoint` with default options.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Fetched<ApiResponse<T>>, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    /// POST a JSON body to `endpoint`.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Unserializable body: {}", e)))?;
        Ok(self.request(endpoint, RequestOptions::post(body)).await?.data)
    }

    /// PUT a JSON body to `endpoint`.
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Unserializable body: {}", e)))?;
        Ok(self.request(endpoint, RequestOptions::put(body)).await?.data)
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        Ok(self.request(endpoint, RequestOptions::delete()).await?.data)
    }

    /// One network attempt, bounded by `timeout` and recorded in the monitor.
    async fn attempt<T>(
        &self,
        request: &HttpRequest,
        endpoint: &str,
        attempt: u32,
        timeout: Duration,
    ) -> Result<(serde_json::Value, ApiResponse<T>), ApiError>
    where
        T: DeserializeOwned,
    {
        let metric_id = self.monitor.begin(request.method, endpoint, attempt);
        let started = Instant::now();

        let sent = match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(timeout.as_millis() as u64)),
        };
        let status_code = sent.as_ref().ok().map(|r| r.status);
        let result = sent.and_then(decode_response::<T>);
        let elapsed = started.elapsed();

        self.monitor
            .complete(&metric_id, result.is_ok(), status_code, elapsed);

        let (outcome, error_kind) = match &result {
            Ok(_) => ("success", "none"),
            Err(error) => ("error", error.kind()),
        };
        metrics::counter!("ticketboard_requests_total",
            "method" => request.method.as_str(),
            "status" => outcome,
            "error_kind" => error_kind
        )
        .increment(1);
        metrics::histogram!("ticketboard_request_duration_seconds",
            "method" => request.method.as_str()
        )
        .record(elapsed.as_secs_f64());

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            attempt,
            status = ?status_code,
            duration_ms = elapsed.as_millis() as u64,
            outcome,
            error_kind,
            "Request attempt settled"
        );

        result
    }
}

/// Check the status and decode the body into both the raw envelope (for the
/// cache) and the typed envelope.
fn decode_response<T>(
    response: HttpResponse,
) -> Result<(serde_json::Value, ApiResponse<T>), ApiError>
where
    T: DeserializeOwned,
{
    if !response.is_success() {
        return Err(ApiError::Status {
            status: response.status,
            status_text: response.status_text,
        });
    }

    let raw: serde_json::Value = if response.body.trim().is_empty() {
        serde_json::json!({ "data": null, "success": true })
    } else {
        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response body: {}", e)))?
    };
    let typed = ApiResponse::<T>::deserialize(&raw)
        .map_err(|e| ApiError::Decode(format!("Unexpected response shape: {}", e)))?;

    Ok((raw, typed))
}
