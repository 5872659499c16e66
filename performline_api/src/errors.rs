//! Error types for the REST client.

use chrono::NaiveDateTime;

use crate::response::{Envelope, ErrorResponse};

/// Errors that can occur when building or issuing API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The HTTP method is not one of get/post/put/delete/options/head.
    #[error("Invalid request method {0}")]
    InvalidMethod(String),

    /// The transport failed before a response was received.
    #[error("Failed to connect to {url}: {source}")]
    BadGateway {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP 403.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(ErrorResponse),

    /// HTTP 404.
    #[error("Not found: {0}")]
    NotFound(ErrorResponse),

    /// HTTP 5xx.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(ErrorResponse),

    /// Any other error status, or a success status carrying `"Status": "error"`.
    #[error("{0}")]
    ErrorResponse(ErrorResponse),

    /// The endpoint is deprecated and its cutoff date has passed.
    #[error("{message}")]
    DeprecatedEndpoint {
        message: String,
        cutoff: Option<NaiveDateTime>,
    },

    /// The pagination loop hit its iteration cap.
    #[error("Request {method} {path} has exceeded the maximum iteration count of {max_iterations}")]
    TooManyIterations {
        method: String,
        path: String,
        max_iterations: usize,
    },

    /// A path lookup hit an absent key or a non-mapping node.
    #[error("Cannot retrieve data element '{0}'")]
    MissingKey(String),

    /// The record type declares no HTTP method for the operation.
    #[error("{operation} is not supported on {resource}")]
    UnsupportedOperation {
        operation: &'static str,
        resource: &'static str,
    },

    /// A URL template placeholder has no value on the record.
    #[error("Cannot format path '{template}': no value for '{field}'")]
    PathTemplate { template: String, field: String },

    /// The request body could not be encoded.
    #[error("Cannot encode data: {0}")]
    Encode(String),

    /// A header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The URL could not be built from base URL, prefix and path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to initialize HTTP client: {0}")]
    ClientInit(String),
}

impl Error {
    /// Returns the decoded error body for HTTP-derived failures.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::AuthenticationFailed(r)
            | Self::NotFound(r)
            | Self::ServiceUnavailable(r)
            | Self::ErrorResponse(r) => Some(r),
            _ => None,
        }
    }

    /// Transport status code for HTTP-derived failures.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.transport_status())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
