//! Track API client for desktop shells
//!
//! Desktop hosts have no page origin, so relative API paths such as
//! `/api/track/7` are resolved against a configured server address.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// `HttpClient` backed by a pooled `reqwest::Client`.
pub struct ReqwestHttpClient {
    client: Client,
    base_url: Option<String>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("minitune/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });
        Self {
            client,
            base_url: None,
        }
    }

    /// Resolve relative request URLs against `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if url.starts_with('/') => format!("{base}{url}"),
            _ => url.to_string(),
        }
    }

    /// One round trip. `Ok(None)` means the server answered with a status
    /// worth retrying (5xx or 429).
    async fn send_once(&self, request: &HttpRequest) -> Result<Option<HttpResponse>> {
        let url = self.resolve_url(&request.url);
        let mut builder = self.client.request(method_of(request.method), url.as_str());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            BridgeError::OperationFailed(if e.is_timeout() {
                format!("Request to {url} timed out")
            } else {
                format!("Request to {url} failed: {e}")
            })
        })?;

        let status = response.status().as_u16();
        if status >= 500 || status == 429 {
            warn!(status, %url, "Track API answered with retryable status");
            return Ok(None);
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        Ok(Some(HttpResponse {
            status,
            headers,
            body,
        }))
    }
}

fn method_of(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, RetryPolicy::default()).await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let attempts = policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = policy.delay_for(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying track API request");
                tokio::time::sleep(delay).await;
            }
            match self.send_once(&request).await {
                Ok(Some(response)) => return Ok(response),
                Ok(None) => {
                    last_error = Some(BridgeError::OperationFailed(format!(
                        "{} kept failing on the server",
                        request.url
                    )))
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Track API request failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed(format!("{} was never sent", request.url))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_urls_use_base() {
        let client = ReqwestHttpClient::new().with_base_url("http://localhost:3000/");

        assert_eq!(
            client.resolve_url("/api/track/7"),
            "http://localhost:3000/api/track/7"
        );
        assert_eq!(
            client.resolve_url("https://cdn.example.com/a.mp3"),
            "https://cdn.example.com/a.mp3"
        );
    }

    #[test]
    fn test_relative_urls_without_base_are_untouched() {
        let client = ReqwestHttpClient::new();
        assert_eq!(client.resolve_url("/api/track/7"), "/api/track/7");
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_error() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_millis(200))
            .with_base_url("http://127.0.0.1:9");
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };

        let result = client
            .execute_with_retry(HttpRequest::get_json("/api/track/1"), policy)
            .await;
        assert!(result.is_err());
    }
}
