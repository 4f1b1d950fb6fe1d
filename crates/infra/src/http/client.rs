//! Shared HTTP client for the Google REST gateways

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use streamsnap_domain::StreamSnapError;
use tracing::{debug, warn};

use crate::errors::InfraError;

/// HTTP client with built-in retry and timeout support.
///
/// The client-wide timeout bounds metadata calls. Media transfers go through
/// [`HttpClient::send_transfer`], which replaces it with a budget sized to
/// the payload.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
    transfer_floor: Duration,
    min_transfer_rate: u64,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, StreamSnapError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, StreamSnapError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    StreamSnapError::Internal("streaming body cannot be retried".into())
                })?
                .build()
                .map_err(|err| StreamSnapError::from(InfraError::from(err)))?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt = attempt + 1, %method, %url, "google api request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "google api response");

                    if status.is_server_error() && attempt + 1 < attempts {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    debug!(
                        attempt = attempt + 1,
                        %method,
                        %url,
                        error = %err,
                        "google api request failed"
                    );

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    let infra: InfraError = err.into();
                    return Err(StreamSnapError::from(infra));
                }
            }
        }

        Err(StreamSnapError::Internal("retry loop ended without a response".into()))
    }

    /// Execute without retries, for requests that must not be repeated
    /// (uploads and other creates).
    pub async fn send_once(&self, builder: RequestBuilder) -> Result<Response, StreamSnapError> {
        let request = builder.build().map_err(|err| StreamSnapError::from(InfraError::from(err)))?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        self.client.execute(request).await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            StreamSnapError::from(InfraError::from(err))
        })
    }

    /// Execute a media upload once, with a timeout sized to `bytes`.
    pub async fn send_transfer(
        &self,
        builder: RequestBuilder,
        bytes: usize,
    ) -> Result<Response, StreamSnapError> {
        let timeout = self.transfer_timeout(bytes);
        debug!(bytes, timeout_secs = timeout.as_secs(), "starting media transfer");
        self.send_once(builder.timeout(timeout)).await
    }

    /// Floor plus the time to push `bytes` at the minimum accepted rate.
    #[must_use]
    pub fn transfer_timeout(&self, bytes: usize) -> Duration {
        let rate = self.min_transfer_rate.max(1);
        let bytes = u64::try_from(bytes).unwrap_or(u64::MAX);
        self.transfer_floor.saturating_add(Duration::from_secs(bytes.div_ceil(rate)))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    connect_timeout: Duration,
    transfer_floor: Duration,
    min_transfer_rate: u64,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            connect_timeout: Duration::from_secs(10),
            transfer_floor: Duration::from_secs(300),
            min_transfer_rate: 32 * 1024,
            user_agent: concat!("streamsnap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Minimum time any media transfer is allowed, regardless of size.
    pub fn transfer_floor(mut self, floor: Duration) -> Self {
        self.transfer_floor = floor;
        self
    }

    /// Slowest upload rate (bytes per second) a transfer budget allows for.
    pub fn min_transfer_rate(mut self, bytes_per_sec: u64) -> Self {
        self.min_transfer_rate = bytes_per_sec.max(1);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, StreamSnapError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|err| StreamSnapError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
            transfer_floor: self.transfer_floor,
            min_transfer_rate: self.min_transfer_rate,
        })
    }
}

/// Pass 2xx responses through; anything else becomes
/// `ProviderApi { status, body }` with the body text preserved.
pub async fn ensure_success(response: Response) -> Result<Response, StreamSnapError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "provider rejected request");
    Err(StreamSnapError::ProviderApi { status: status.as_u16(), body })
}

/// [`ensure_success`] followed by JSON decoding.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StreamSnapError> {
    ensure_success(response)
        .await?
        .json::<T>()
        .await
        .map_err(|err| StreamSnapError::from(InfraError::from(err)))
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}
