//! Authenticated client for the PerformLine API.

use std::sync::Arc;

use performline_api::{RestClient, Stats};

use crate::config::ClientConfig;
use crate::error::PerformLineError;
use crate::products::{CallCenter, ChatScout, Common, Web};

/// PerformLine API client.
///
/// Wraps a [`RestClient`] configured with the account's API token and hands
/// out one service object per product.
#[derive(Clone, Debug)]
pub struct Client {
    inner: RestClient,
}

impl Client {
    /// Creates a client for the production API.
    pub fn new(api_key: &str) -> Result<Self, PerformLineError> {
        Self::from_config(&ClientConfig::new(api_key))
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, PerformLineError> {
        Self::from_config(&ClientConfig::new(api_key).with_url(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, PerformLineError> {
        let api_key = config.api_key()?;
        let mut inner = RestClient::new(&config.url)?
            .with_prefix(&config.prefix)
            .with_header("Authorization", &format!("Token {}", api_key))
            .with_implemented_by("performline");
        if let Some(timeout) = config.timeout {
            inner = inner.with_timeout(timeout);
        }

        tracing::debug!("PerformLine client for {} (prefix '{}')", config.url, config.prefix);
        Ok(Self { inner })
    }

    /// Reports request statistics to `stats`.
    pub fn with_stats(mut self, stats: Arc<dyn Stats>) -> Self {
        self.inner = self.inner.with_stats(stats);
        self
    }

    /// The underlying REST client, for endpoints without a dedicated accessor.
    pub fn rest(&self) -> &RestClient {
        &self.inner
    }

    pub fn common(&self) -> Common<'_> {
        Common::new(&self.inner)
    }

    pub fn web(&self) -> Web<'_> {
        Web::new(&self.inner)
    }

    pub fn callcenter(&self) -> CallCenter<'_> {
        CallCenter::new(&self.inner)
    }

    pub fn chatscout(&self) -> ChatScout<'_> {
        ChatScout::new(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn requires_api_key() {
        let err = Client::from_config(&ClientConfig::default()).unwrap_err();
        assert!(matches!(err, PerformLineError::Config(ConfigError::MissingApiKey)));
    }

    #[test]
    fn prefix_is_applied() {
        let config = ClientConfig::new("k")
            .with_url("http://localhost:1")
            .with_prefix("staging");
        let client = Client::from_config(&config).unwrap();
        assert_eq!(client.rest().make_url("/common/brands/"), "http://localhost:1/staging/common/brands/");
    }
}
