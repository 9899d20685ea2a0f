use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::{Config, RodinConfig, ServerConfig, TelemetryConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        // Placeholders are expanded on the raw text, before TOML sees it
        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        tracing::debug!(path = %path.display(), "configuration loaded");

        Ok(config)
    }

    /// Configuration with every setting at its default and the given API key
    pub fn from_api_key(api_key: SecretString) -> Self {
        Self {
            rodin: RodinConfig::new(api_key),
            server: ServerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Validate that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty, the base URL cannot carry
    /// endpoint paths, or a retry budget is zero
    pub fn validate(&self) -> anyhow::Result<()> {
        let rodin = &self.rodin;

        if rodin.api_key.expose_secret().trim().is_empty() {
            anyhow::bail!("rodin.api_key must not be empty");
        }

        if rodin.base_url.cannot_be_a_base() {
            anyhow::bail!("rodin.base_url must be an absolute http(s) URL");
        }

        // Endpoints are joined relative to the base, so a missing slash drops its last segment
        if !rodin.base_url.path().ends_with('/') {
            anyhow::bail!("rodin.base_url must end with '/' (got {})", rodin.base_url);
        }

        // Retry budgets count the first attempt
        if rodin.poll.max_attempts == 0 {
            anyhow::bail!("rodin.poll.max_attempts must be greater than 0");
        }

        if rodin.download.max_attempts == 0 {
            anyhow::bail!("rodin.download.max_attempts must be greater than 0");
        }

        Ok(())
    }
}
