//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Dataplex REST endpoint.
pub const DEFAULT_BASE_PATH: &str = "https://dataplex.googleapis.com/v1/";

/// Retry and polling budgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per HTTP request, including the first (default: 4).
    pub max_attempts: u32,
    /// First backoff delay in milliseconds (default: 500).
    pub initial_backoff_ms: u64,
    /// Cap on any single backoff in milliseconds (default: 16_000).
    pub max_backoff_ms: u64,
    /// Times a whole apply restarts after a 409 (default: 3).
    pub conflict_retries: u32,
    /// GETs after a delete operation before giving up on seeing 404 (default: 10).
    pub delete_confirm_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 500,
            max_backoff_ms: 16_000,
            conflict_retries: 3,
            delete_confirm_attempts: 10,
        }
    }
}

impl RetryConfig {
    /// Exponential delay for the given zero-based attempt, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(exponential.min(self.max_backoff_ms))
    }

    /// No waiting between attempts; used by tests against mock servers.
    pub fn immediate() -> Self {
        Self {
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            ..Self::default()
        }
    }
}

/// Settings shared by every Dataplex call made through a [`crate::dataplex::Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Overrides [`DEFAULT_BASE_PATH`] when set.
    pub base_path: Option<String>,
    pub user_agent: String,
    /// Deadline for a whole apply or delete.
    pub timeout: Duration,
    /// First LRO poll delay.
    pub poll_interval: Duration,
    /// Cap on LRO poll delay.
    pub max_poll_interval: Duration,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            user_agent: format!("dplx/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(20 * 60),
            poll_interval: Duration::from_secs(1),
            max_poll_interval: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_interval(mut self, initial: Duration, max: Duration) -> Self {
        self.poll_interval = initial;
        self.max_poll_interval = max;
        self
    }

    /// Base path in effect, always ending in `/`.
    pub fn effective_base_path(&self) -> String {
        let base = self.base_path.as_deref().unwrap_or(DEFAULT_BASE_PATH);
        if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let retry = RetryConfig::default();
        assert_eq!(retry.backoff(0), Duration::from_millis(500));
        assert_eq!(retry.backoff(1), Duration::from_millis(1000));
        assert_eq!(retry.backoff(3), Duration::from_millis(4000));
        assert_eq!(retry.backoff(10), Duration::from_millis(16_000));
        assert_eq!(retry.backoff(80), Duration::from_millis(16_000));
    }

    #[test]
    fn test_effective_base_path() {
        let config = ClientConfig::default();
        assert_eq!(config.effective_base_path(), DEFAULT_BASE_PATH);
        let config = config.with_base_path("http://127.0.0.1:9000/v1");
        assert_eq!(config.effective_base_path(), "http://127.0.0.1:9000/v1/");
    }
}
