//! Programmatic configuration builder for integration tests

use std::time::Duration;

use rodin_config::{Config, DownloadConfig, PollConfig};
use secrecy::SecretString;

/// API key the mock vendor expects in the bearer header
pub const TEST_API_KEY: &str = "rk-integration";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder pointed at a mock vendor, with millisecond delays
    pub fn new(base_url: &url::Url) -> Self {
        let mut config = Config::from_api_key(SecretString::from(TEST_API_KEY));
        config.rodin.base_url = base_url.clone();
        config.rodin.poll = PollConfig {
            max_attempts: 3,
            interval: Duration::from_millis(10),
        };
        config.rodin.download = DownloadConfig {
            max_attempts: 3,
            retry_delay: Duration::from_millis(10),
        };

        Self { config }
    }

    /// Override the number of status polls per call
    pub fn with_poll_attempts(mut self, max_attempts: u32) -> Self {
        self.config.rodin.poll.max_attempts = max_attempts;
        self
    }

    /// Override the number of fetch attempts per asset
    pub fn with_download_attempts(mut self, max_attempts: u32) -> Self {
        self.config.rodin.download.max_attempts = max_attempts;
        self
    }

    pub fn build(self) -> Config {
        self.config.validate().expect("test config is valid");
        self.config
    }
}
