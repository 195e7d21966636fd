//! Runtime configuration resolved from command-line arguments

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{
    ApiKey, CityDirectory, DirectoryClient, WeatherClient, WeatherSource, API_KEY_ENV,
    DEFAULT_DIRECTORY_URL, DEFAULT_WEATHER_URL,
};
use crate::retry::{RetryConfig, Retrying};

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub directory_url: String,
    pub weather_url: String,
    /// Name of the variable holding the weather API key. The key itself is
    /// only read when a request is made.
    pub api_key_env: String,
    /// Zero sends every keystroke straight through
    pub search_debounce: Duration,
    /// `None` disables retries entirely
    pub retry: Option<RetryConfig>,
    pub log_file: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            api_key_env: API_KEY_ENV.to_string(),
            search_debounce: Duration::ZERO,
            retry: None,
            log_file: None,
        }
    }
}

impl RuntimeConfig {
    pub fn with_debounce_ms(mut self, millis: u64) -> Self {
        self.search_debounce = Duration::from_millis(millis);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retry = (retries > 0).then(|| RetryConfig::with_retries(retries));
        self
    }

    /// Build the API clients, wrapped in the retry decorator when enabled
    pub fn services(&self) -> Services {
        let directory = DirectoryClient::new(self.directory_url.clone());
        let weather = WeatherClient::new(
            self.weather_url.clone(),
            ApiKey::Env(self.api_key_env.clone()),
        );
        match &self.retry {
            Some(retry) => Services {
                directory: Arc::new(Retrying::new(directory, retry.clone())),
                weather: Arc::new(Retrying::new(weather, retry.clone())),
            },
            None => Services {
                directory: Arc::new(directory),
                weather: Arc::new(weather),
            },
        }
    }
}

/// Shared handles to both upstream APIs
#[derive(Clone)]
pub struct Services {
    pub directory: Arc<dyn CityDirectory>,
    pub weather: Arc<dyn WeatherSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_debounce_or_retry() {
        let config = RuntimeConfig::default();
        assert_eq!(config.search_debounce, Duration::ZERO);
        assert!(config.retry.is_none());
        assert_eq!(config.api_key_env, "OPENWEATHER_API_KEY");
    }

    #[test]
    fn test_zero_retries_stays_disabled() {
        let config = RuntimeConfig::default().with_retries(0);
        assert!(config.retry.is_none());

        let config = RuntimeConfig::default().with_retries(2);
        assert_eq!(config.retry.map(|r| r.max_retries), Some(2));
    }

    #[test]
    fn test_debounce_from_millis() {
        let config = RuntimeConfig::default().with_debounce_ms(250);
        assert_eq!(config.search_debounce, Duration::from_millis(250));
    }
}
