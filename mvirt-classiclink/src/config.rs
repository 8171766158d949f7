//! Control-plane client configuration.

use std::time::Duration;

use clap::Args;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Control-plane endpoint is required")]
    EndpointRequired,

    #[error("Invalid control-plane endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Connection settings for the control-plane API.
#[derive(Args, Debug, Clone)]
pub struct ClientConfig {
    /// Control-plane API endpoint (e.g., http://[::1]:50060)
    #[arg(
        long,
        env = "MVIRT_CLASSICLINK_ENDPOINT",
        default_value = "http://[::1]:50060"
    )]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "MVIRT_CLASSICLINK_TIMEOUT", default_value = "30")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Sub-second timeouts are rounded up to the next whole second.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let mut timeout_secs = timeout.as_secs();
        if timeout.subsec_nanos() > 0 {
            timeout_secs += 1;
        }
        Self {
            endpoint: endpoint.into(),
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Endpoint without trailing slash, for joining paths.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::EndpointRequired);
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
