use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default Rodin API root; endpoint paths (`v2/rodin`, ...) are joined onto it
pub const DEFAULT_BASE_URL: &str = "https://hyperhuman.deemos.com/api/";

/// Rodin API access and pipeline policies
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RodinConfig {
    /// Bearer token sent with submit and status calls
    pub api_key: SecretString,
    /// API root URL, must end with a slash
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Per-request transport timeout
    #[serde(default = "default_request_timeout", deserialize_with = "crate::duration::deserialize")]
    pub request_timeout: Duration,
    /// Status polling policy
    #[serde(default)]
    pub poll: PollConfig,
    /// Asset download policy
    #[serde(default)]
    pub download: DownloadConfig,
}

impl RodinConfig {
    /// Build a configuration with default endpoints and policies
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            poll: PollConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

/// How often and how long `try_download_result` polls job status
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// Status requests per invocation before reporting "not finished"
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
    /// Pause between status requests
    #[serde(default = "default_poll_interval", deserialize_with = "crate::duration::deserialize")]
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_poll_attempts(),
            interval: default_poll_interval(),
        }
    }
}

/// Per-asset retry policy for result downloads
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    /// Total attempts per asset, including the first
    #[serde(default = "default_download_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts
    #[serde(default = "default_retry_delay", deserialize_with = "crate::duration::deserialize")]
    pub retry_delay: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_download_attempts(),
            retry_delay: default_retry_delay(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL must be valid")
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(120)
}

const fn default_poll_attempts() -> u32 {
    3
}

const fn default_poll_interval() -> Duration {
    Duration::from_millis(1500)
}

const fn default_download_attempts() -> u32 {
    3
}

const fn default_retry_delay() -> Duration {
    Duration::from_secs(1)
}
