//! Configuration for the storefront client.
//!
//! Loads configuration from environment variables with sensible defaults.

use boletera_api::{ApiError, StorefrontClient};
use boletera_runtime::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Backend API base URL, including the version prefix
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Retries after the first attempt for idempotent reads
    pub read_retries: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            request_timeout: 30,
            read_retries: RetryPolicy::reads().max_retries,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables: `BOLETERA_API_URL`, `BOLETERA_REQUEST_TIMEOUT` (seconds),
    /// `BOLETERA_READ_RETRIES`. Unset or unparsable values fall back to the
    /// defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_base_url: env::var("BOLETERA_API_URL").unwrap_or(defaults.api_base_url),
            request_timeout: env::var("BOLETERA_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout),
            read_retries: env::var("BOLETERA_READ_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.read_retries),
        }
    }

    /// The read retry policy this configuration describes.
    #[must_use]
    pub fn read_retry(&self) -> RetryPolicy {
        RetryPolicy::reads().with_max_retries(self.read_retries)
    }

    /// Build the backend client with the configured timeout.
    ///
    /// # Errors
    ///
    /// [`ApiError::Network`] if the underlying HTTP client cannot be built.
    pub fn build_client(&self) -> Result<StorefrontClient, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(StorefrontClient::with_http_client(http, &self.api_base_url))
    }
}
