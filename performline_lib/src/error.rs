//! Error types for the library layer.

use std::fmt;

use crate::config::ConfigError;

/// Errors produced by the library layer, wrapping upstream API errors
/// and adding configuration, serialization, and input failures.
#[derive(Debug)]
pub enum PerformLineError {
    /// An error from the underlying REST client.
    Api(performline_api::Error),
    /// The client could not be configured (e.g. no API key).
    Config(ConfigError),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// A record lacks data needed for the operation, or caller input is invalid.
    InvalidInput(String),
}

impl PerformLineError {
    /// The decoded error body, when the failure came from an HTTP response.
    pub fn response(&self) -> Option<&performline_api::ErrorResponse> {
        match self {
            Self::Api(e) => e.response(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_not_found())
    }
}

impl fmt::Display for PerformLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for PerformLineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<performline_api::Error> for PerformLineError {
    fn from(e: performline_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<ConfigError> for PerformLineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<serde_json::Error> for PerformLineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
