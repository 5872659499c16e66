//! Client configuration from explicit values or `PERFORMLINE_*` environment variables.

use std::time::Duration;

pub const DEFAULT_URL: &str = "https://api.performline.com";
pub const ENV_API_KEY: &str = "PERFORMLINE_API_KEY";
pub const ENV_API_URL: &str = "PERFORMLINE_API_URL";
pub const ENV_API_PREFIX: &str = "PERFORMLINE_API_PREFIX";
pub const ENV_TIMEOUT_SECS: &str = "PERFORMLINE_TIMEOUT_SECS";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no API key given; pass --api-key or set PERFORMLINE_API_KEY")]
    MissingApiKey,
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Connection settings for [`crate::Client`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub url: String,
    pub prefix: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: DEFAULT_URL.to_string(),
            prefix: String::new(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: &str) -> Self {
        Self::default().with_api_key(api_key)
    }

    /// Reads settings from the process environment. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(key) = get(ENV_API_KEY) {
            config.api_key = Some(key);
        }
        if let Some(url) = get(ENV_API_URL) {
            config.url = url;
        }
        if let Some(prefix) = get(ENV_API_PREFIX) {
            config.prefix = prefix;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                name: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The API key, or [`ConfigError::MissingApiKey`] if none is set.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}
