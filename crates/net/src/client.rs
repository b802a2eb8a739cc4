//! HTTP client with connection pooling and retry logic

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use vend_errors::{Error, NetworkError};

/// Retries never back off longer than this, jitter included.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Keep-alive timeout for pooled connections
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
    /// Retry count for transient transport failures
    pub retry_count: u32,
    /// Base delay between retries, grown exponentially
    pub retry_delay: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300), // 5 minutes for large file transfers
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: format!("vend/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl NetConfig {
    /// Build a client configuration from the loaded application config.
    #[must_use]
    pub fn from_config(config: &vend_config::Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.network.timeout),
            retry_count: config.network.retries,
            retry_delay: Duration::from_secs(config.network.retry_delay),
            ..Self::default()
        }
    }
}

/// HTTP client with retry support
#[derive(Clone, Debug)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a client with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// GET a URL, retrying transient transport failures.
    ///
    /// The response is returned whatever its status; callers decide what
    /// a non-2xx status means for them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered after all
    /// retries, or if the server asks us to back off.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(|| self.client.get(url).send()).await
    }

    /// GET a URL with a bearer token attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered after all
    /// retries, or if the server asks us to back off.
    pub async fn get_with_bearer(&self, url: &str, token: &str) -> Result<Response, Error> {
        self.retry_request(|| self.client.get(url).bearer_auth(token).send())
            .await
    }

    /// POST a JSON body, optionally with a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered after all
    /// retries, or if the server asks us to back off.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        token: Option<&str>,
        body: &T,
    ) -> Result<Response, Error> {
        self.retry_request(|| {
            let mut request = self.client.post(url).json(body);
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
            request.send()
        })
        .await
    }

    /// POST an empty body with a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered after all
    /// retries, or if the server asks us to back off.
    pub async fn post_bearer(&self, url: &str, token: &str) -> Result<Response, Error> {
        self.retry_request(|| self.client.post(url).bearer_auth(token).send())
            .await
    }

    /// POST form-encoded fields without any auth header.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered after all
    /// retries, or if the server asks us to back off.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<Response, Error> {
        self.retry_request(|| self.client.post(url).form(fields).send())
            .await
    }

    /// Execute a request with retry logic.
    ///
    /// Only transport-level failures are retried. A response is returned
    /// regardless of status, except 429 which is surfaced as `RateLimited`
    /// so callers do not hammer the server.
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> Result<Response, Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = reqwest::Result<Response>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt, self.config.retry_delay)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        let seconds = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(60);
                        return Err(NetworkError::RateLimited { seconds }.into());
                    }
                    return Ok(response);
                }
                Err(e) if Self::should_retry(&e) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(map_transport_error(&e)),
            }
        }

        match last_error {
            Some(e) => Err(map_transport_error(&e)),
            None => Err(NetworkError::NetworkUnavailable.into()),
        }
    }

    /// Whether a transport error is worth another attempt
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || (error.is_request() && error.status().is_none())
    }

    /// Access the underlying reqwest client
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Exponential backoff with jitter so synchronized clients spread out.
fn backoff_delay(attempt: u32, initial: Duration) -> Duration {
    let exponential = initial.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    let capped = exponential.min(MAX_RETRY_DELAY);
    let jitter = 0.75 + rand::random::<f64>() * 0.5;
    capped.mul_f64(jitter)
}

/// Translate a reqwest transport error into our error taxonomy.
fn map_transport_error(error: &reqwest::Error) -> Error {
    if error.is_timeout() {
        let url = error.url().map(ToString::to_string).unwrap_or_default();
        NetworkError::Timeout { url }.into()
    } else if error.is_connect() {
        NetworkError::ConnectionRefused(error.to_string()).into()
    } else if error.is_builder() {
        NetworkError::InvalidUrl(error.to_string()).into()
    } else {
        NetworkError::TransferInterrupted(error.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let initial = Duration::from_secs(1);
        for _ in 0..20 {
            let first = backoff_delay(1, initial);
            assert!(first >= Duration::from_millis(750));
            assert!(first <= Duration::from_millis(1250));

            let tenth = backoff_delay(10, initial);
            assert!(tenth <= MAX_RETRY_DELAY.mul_f64(1.25));
        }
    }

    #[test]
    fn default_config_identifies_client() {
        let config = NetConfig::default();
        assert!(config.user_agent.starts_with("vend/"));
        assert_eq!(config.retry_count, 3);
    }
}
