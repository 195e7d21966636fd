//! Opt-in retry with exponential backoff, layered over the API clients
//!
//! Nothing retries unless a client is wrapped in [`Retrying`]. Only transient
//! failures are retried: timeouts, connection errors, 5xx, 408 and 429.
//! Auth failures and malformed bodies are returned immediately.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{ApiError, CityDirectory, PageRequest, WeatherSource};
use crate::state::{City, UnitPreference, WeatherSnapshot};

pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 5000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    pub fn with_retries(max_retries: u32) -> Self {
        Self::new(max_retries, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS)
    }

    /// Backoff before retry number `attempt` (zero-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64))
    }
}

pub fn is_retryable(error: &ApiError) -> bool {
    match error {
        ApiError::Request(e) => e.is_timeout() || e.is_connect(),
        ApiError::Status(status) => {
            status.is_server_error()
                || *status == StatusCode::TOO_MANY_REQUESTS
                || *status == StatusCode::REQUEST_TIMEOUT
        }
        ApiError::Parse(_) | ApiError::MissingApiKey => false,
    }
}

async fn run_with_retry<T, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(retries = attempt, "request succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if attempt < config.max_retries && is_retryable(&error) => {
                let delay = config.delay_for_attempt(attempt);
                attempt += 1;
                tracing::debug!(
                    attempt,
                    max_retries = config.max_retries,
                    ?delay,
                    %error,
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Decorator adding retries to a [`CityDirectory`] or [`WeatherSource`]
#[derive(Clone, Debug)]
pub struct Retrying<T> {
    inner: T,
    config: RetryConfig,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl<T: CityDirectory> CityDirectory for Retrying<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<City>, ApiError> {
        let inner = &self.inner;
        run_with_retry(&self.config, move || inner.fetch_page(request)).await
    }
}

#[async_trait]
impl<T: WeatherSource> WeatherSource for Retrying<T> {
    async fn current_weather(
        &self,
        city: &str,
        unit: UnitPreference,
    ) -> Result<WeatherSnapshot, ApiError> {
        let inner = &self.inner;
        run_with_retry(&self.config, move || inner.current_weather(city, unit)).await
    }
}
