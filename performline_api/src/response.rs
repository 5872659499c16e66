//! Accessors over the standard response envelope.
//!
//! Every API response shares one JSON shape:
//!
//! ```json
//! {
//!   "Status": "success",
//!   "StatusCode": 200,
//!   "Results": [...],
//!   "ResultCount": {"Total": 25, "Current": 2, "Limit": 2, "Offset": 4, "Pages": 13},
//!   "Metadata": {...},
//!   "ErrorMessage": "...",
//!   "ErrorDetails": "..."
//! }
//! ```

use std::fmt;

use reqwest::header::HeaderMap;
use serde_json::{json, Map, Value};

use crate::{dicts, Error};

/// Accessors shared by [`SuccessResponse`] and [`ErrorResponse`].
pub trait Envelope {
    /// The decoded body, if there was one.
    fn payload(&self) -> Option<&Value>;

    /// The HTTP status code the transport reported.
    fn transport_status(&self) -> u16;

    /// The status code embedded in the payload, falling back to the transport's.
    fn status_code(&self) -> u16 {
        self.get("StatusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or_else(|| self.transport_status())
    }

    /// The `Status` field: `"success"` or `"error"`.
    fn response_status(&self) -> Result<&str, Error> {
        self.must_get("Status")?
            .as_str()
            .ok_or_else(|| Error::MissingKey("Status".to_string()))
    }

    /// True when the payload says `"Status": "error"`.
    fn has_error(&self) -> bool {
        self.get("Status").and_then(Value::as_str) == Some("error")
    }

    fn metadata(&self) -> Option<&Value> {
        self.get("Metadata")
    }

    /// Looks up a `/`-separated path inside `Metadata`.
    fn metadata_get(&self, path: &str) -> Option<&Value> {
        self.metadata().and_then(|m| dicts::get(m, path))
    }

    fn must_get(&self, path: &str) -> Result<&Value, Error> {
        match self.payload() {
            Some(payload) => dicts::must_get(payload, path),
            None => Err(Error::MissingKey(path.to_string())),
        }
    }

    fn get(&self, path: &str) -> Option<&Value> {
        self.payload().and_then(|p| dicts::get(p, path))
    }
}

/// A response with a status code below 400.
#[derive(Debug, Clone)]
pub struct SuccessResponse {
    status: u16,
    headers: HeaderMap,
    payload: Option<Value>,
}

impl SuccessResponse {
    pub fn new(status: u16, headers: HeaderMap, payload: Option<Value>) -> Self {
        Self {
            status,
            headers,
            payload,
        }
    }

    /// Wraps a bare payload as if it arrived with HTTP 200.
    pub fn from_payload(payload: Value) -> Self {
        Self::new(200, HeaderMap::new(), Some(payload))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_payload(self) -> Option<Value> {
        self.payload
    }

    fn count(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(Value::as_u64)
    }

    /// Total number of results matching the query across all pages.
    pub fn total_length(&self) -> u64 {
        self.count("ResultCount/Total").unwrap_or(0)
    }

    /// Number of results in this page.
    ///
    /// Defaults to [`total_length`](Self::total_length) and never exceeds a
    /// reported total.
    pub fn length(&self) -> u64 {
        match (self.count("ResultCount/Current"), self.count("ResultCount/Total")) {
            (Some(current), Some(total)) => current.min(total),
            (Some(current), None) => current,
            (None, _) => self.total_length(),
        }
    }

    /// Page size; defaults to [`length`](Self::length).
    pub fn limit(&self) -> u64 {
        self.count("ResultCount/Limit")
            .unwrap_or_else(|| self.length())
    }

    /// Position of this page's first result within the full result set.
    pub fn offset(&self) -> u64 {
        self.count("ResultCount/Offset").unwrap_or(0)
    }

    pub fn total_pages(&self) -> u64 {
        match self.limit() {
            0 => 0,
            limit => self.total_length().div_ceil(limit),
        }
    }

    /// 1-based page number of this response.
    pub fn current_page(&self) -> u64 {
        match (self.offset(), self.limit()) {
            (0, _) | (_, 0) => 1,
            (offset, limit) => offset / limit + 1,
        }
    }

    /// The `Results` list. A single non-list result becomes a one-element list.
    pub fn results(&self) -> Vec<Value> {
        match self.get("Results") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        }
    }

    /// One result by index, or an empty mapping when out of range.
    pub fn result(&self, index: usize) -> Value {
        self.results()
            .into_iter()
            .nth(index)
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Collects the value at `path` from every mapping in `Results`.
    /// Entries that lack the path are skipped.
    pub fn results_get(&self, path: &str) -> Vec<Value> {
        self.results()
            .iter()
            .filter_map(|r| dicts::get(r, path).cloned())
            .collect()
    }
}

impl Envelope for SuccessResponse {
    fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    fn transport_status(&self) -> u16 {
        self.status
    }
}

/// A response with a status code of 400 or more, or a `"Status": "error"` body.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    status: u16,
    headers: HeaderMap,
    payload: Value,
    message: String,
}

impl ErrorResponse {
    pub fn new(status: u16, headers: HeaderMap, payload: Value) -> Self {
        let message = error_text(&payload, "ErrorDetails")
            .or_else(|| error_text(&payload, "ErrorMessage"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Self {
            status,
            headers,
            payload,
            message,
        }
    }

    /// Builds the minimal error body used when the server's body is not JSON.
    pub fn synthesized(status: u16, headers: HeaderMap, text: &str) -> Self {
        let body = json!({
            "Status": "error",
            "StatusCode": status,
            "ErrorMessage": text,
        });
        Self::new(status, headers, body)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_message(&self) -> Option<&str> {
        self.get("ErrorMessage").and_then(Value::as_str)
    }

    pub fn error_details(&self) -> Option<&str> {
        self.get("ErrorDetails").and_then(Value::as_str)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Value {
        &self.payload
    }
}

fn error_text<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    dicts::get(payload, key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

impl Envelope for ErrorResponse {
    fn payload(&self) -> Option<&Value> {
        Some(&self.payload)
    }

    fn transport_status(&self) -> u16 {
        self.status
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Builds response envelopes in the API's format, for mock servers and tests.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    results: Option<Value>,
    status_code: u16,
    metadata: Option<Value>,
    limit: Option<u64>,
    offset: Option<u64>,
    total: Option<u64>,
    parameters: Value,
}

impl EnvelopeBuilder {
    /// Starts a success envelope around `results` (a list, a single record, or null).
    pub fn new(results: Value) -> Self {
        Self {
            results: if results.is_null() { None } else { Some(results) },
            status_code: 200,
            metadata: None,
            limit: None,
            offset: None,
            total: None,
            parameters: Value::Object(Map::new()),
        }
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn build(self) -> Value {
        let mut payload = Map::new();
        payload.insert("StatusCode".into(), json!(self.status_code));
        let status = if self.status_code < 400 { "success" } else { "error" };
        payload.insert("Status".into(), json!(status));

        if let Some(results) = self.results {
            let results = match results {
                Value::Array(items) => items,
                single => vec![single],
            };

            let mut count = Map::new();
            let total = self.total.unwrap_or(results.len() as u64);
            count.insert("Total".into(), json!(total));
            if (results.len() as u64) < total {
                count.insert("Current".into(), json!(results.len()));
            }
            if let Some(limit) = self.limit {
                count.insert("Limit".into(), json!(limit));
                count.insert("Offset".into(), json!(0));
            }
            if let Some(offset) = self.offset {
                count.insert("Offset".into(), json!(offset));
            }

            payload.insert("Results".into(), Value::Array(results));
            payload.insert("ResultCount".into(), Value::Object(count));
        }

        if let Some(metadata) = self.metadata {
            payload.insert("Metadata".into(), metadata);
        }
        payload.insert("Parameters".into(), self.parameters);

        Value::Object(payload)
    }
}
