//! HTTP request wrapper and pagination driver.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use url::Url;

use crate::{
    response::{Envelope, ErrorResponse, SuccessResponse},
    stats::{self, NoopStats, Stats, Tags},
    Error,
};

/// Query string parameters. Booleans are sent as `true`/`false`, nulls are
/// dropped and arrays repeat the key.
pub type Params = BTreeMap<String, Value>;

/// HTTP headers as plain name/value pairs.
pub type Headers = BTreeMap<String, String>;

/// Signature of a pagination predicate, see [`RestClient::request_until`].
pub type UntilFn = fn(usize, &SuccessResponse, &mut RequestContext) -> bool;

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_MAX_ITERATIONS: usize = 25;

const DEPRECATED_HEADER: &str = "x-performline-deprecated";
const DEPRECATED_AFTER_HEADER: &str = "x-performline-deprecated-after";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "delete" => Ok(Method::Delete),
            "options" => Ok(Method::Options),
            "head" => Ok(Method::Head),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// How a request body is serialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoder {
    #[default]
    Json,
    Yaml,
    /// Strings are sent as-is; anything else is sent as compact JSON.
    None,
}

impl Encoder {
    fn encode(&self, data: &Value) -> Result<String, Error> {
        match self {
            Encoder::Json => serde_json::to_string(data).map_err(|e| Error::Encode(e.to_string())),
            Encoder::Yaml => serde_yml::to_string(data).map_err(|e| Error::Encode(e.to_string())),
            Encoder::None => Ok(match data {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

impl FromStr for Encoder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Encoder::Json),
            "yaml" | "yml" => Ok(Encoder::Yaml),
            "none" | "" => Ok(Encoder::None),
            other => Err(Error::Encode(format!("encoder \"{}\" not implemented", other))),
        }
    }
}

/// Per-call request options. Built fresh for every call.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub data: Option<Value>,
    pub params: Params,
    pub headers: Headers,
    pub encoder: Encoder,
    pub content_type: Option<String>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Loop controls for [`RestClient::request_until`].
#[derive(Clone, Copy, Debug)]
pub struct UntilOptions {
    /// `None` disables the cap.
    pub max_iterations: Option<usize>,
    pub request_delay: Duration,
}

impl Default for UntilOptions {
    fn default() -> Self {
        Self {
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            request_delay: Duration::ZERO,
        }
    }
}

impl UntilOptions {
    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }
}

/// The next request of a pagination loop. Predicates may rewrite any of it.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub options: RequestOptions,
}

impl RequestContext {
    pub fn new(method: Method, path: &str, options: RequestOptions) -> Self {
        Self {
            method,
            path: path.to_string(),
            options,
        }
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.options.params
    }
}

/// Generic client for the standard PerformLine REST envelope.
///
/// Holds the base URL, an optional path prefix and the headers and query
/// parameters sent with every request. Instance defaults are read-only once
/// the client is built and win over per-call values on key collision.
#[derive(Clone)]
pub struct RestClient {
    url: String,
    prefix: String,
    content_type: Option<String>,
    headers: Headers,
    params: Params,
    implemented_by: Option<String>,
    timeout: Option<Duration>,
    session: reqwest::Client,
    stats: Arc<dyn Stats>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("url", &self.url)
            .field("prefix", &self.prefix)
            .field("content_type", &self.content_type)
            .field("implemented_by", &self.implemented_by)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Creates a client rooted at `url` with its own HTTP session.
    pub fn new(url: &str) -> Result<Self, Error> {
        let session = reqwest::Client::builder()
            .user_agent(concat!("performline-rust/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::ClientInit(e.to_string())
            })?;

        Ok(Self {
            url: url.to_string(),
            prefix: String::new(),
            content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
            headers: Headers::new(),
            params: Params::new(),
            implemented_by: None,
            timeout: None,
            session,
            stats: Arc::new(NoopStats),
        })
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Sets the default `Content-Type`; `None` sends no default.
    pub fn with_content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(str::to_string);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Tags request statistics with the name of the calling component.
    pub fn with_implemented_by(mut self, name: &str) -> Self {
        self.implemented_by = Some(name.to_string());
        self
    }

    /// Default timeout for requests that do not set their own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reuses an existing HTTP session.
    pub fn with_session(mut self, session: reqwest::Client) -> Self {
        self.session = session;
        self
    }

    pub fn with_stats(mut self, stats: Arc<dyn Stats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Joins base URL, prefix and path, dropping empty segments. The result
    /// always ends in `/`.
    pub fn make_url(&self, path: &str) -> String {
        let segments: Vec<&str> = [self.prefix.trim_matches('/'), path.trim_matches('/')]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();

        let base = self.url.trim_end_matches('/');
        if segments.is_empty() {
            format!("{}/", base)
        } else {
            format!("{}/{}/", base, segments.join("/"))
        }
    }

    fn build_headers(&self, options: &RequestOptions) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            insert_header(&mut headers, name, value)?;
        }

        let content_type = options
            .content_type
            .as_deref()
            .or(self.content_type.as_deref());
        if let Some(content_type) = content_type {
            insert_header(&mut headers, CONTENT_TYPE.as_str(), content_type)?;
        }

        for (name, value) in &self.headers {
            insert_header(&mut headers, name, value)?;
        }
        Ok(headers)
    }

    fn merge_params(&self, options: &RequestOptions) -> Params {
        let mut params = options.params.clone();
        params.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }

    fn stat_tags(&self, method: Method) -> Tags {
        let mut tags = Tags::new();
        tags.insert("method".into(), method.as_str().into());
        let domain = Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.url.clone());
        tags.insert("domain".into(), domain);
        if let Some(implemented_by) = &self.implemented_by {
            tags.insert("implemented_by".into(), implemented_by.clone());
        }
        tags
    }

    /// Issues one request.
    ///
    /// Statuses below 400 yield a [`SuccessResponse`] unless the body says
    /// `"Status": "error"`. Higher statuses map to
    /// [`Error::AuthenticationFailed`] (403), [`Error::NotFound`] (404),
    /// [`Error::ServiceUnavailable`] (5xx) or [`Error::ErrorResponse`].
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        let method: Method = method.parse()?;
        self.execute(method, path, &options).await
    }

    /// Issues the request described by a pagination context.
    pub async fn execute_context(&self, context: &RequestContext) -> Result<SuccessResponse, Error> {
        self.execute(context.method, &context.path, &context.options)
            .await
    }

    /// Issues one request with an already-parsed method.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        let path = path.trim_matches('/');
        let url = self.make_url(path);
        let parsed = Url::parse(&url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

        let headers = self.build_headers(options)?;
        let query = query_pairs(&self.merge_params(options));

        let mut builder = self
            .session
            .request(method.to_reqwest(), parsed)
            .headers(headers)
            .query(&query);

        if let Some(data) = &options.data {
            builder = builder.body(options.encoder.encode(data)?);
        }
        if let Some(timeout) = options.timeout.or(self.timeout) {
            builder = builder.timeout(timeout);
        }

        let mut tags = self.stat_tags(method);
        self.stats.increment(stats::METRIC_REQUEST, 1, &tags);
        tracing::debug!("{} {} params={:?}", method, url, query);

        let started = Instant::now();
        let sent = builder.send().await;
        self.stats
            .timing(stats::METRIC_REQUEST_TIME, started.elapsed(), &tags);

        let response = sent.map_err(|source| {
            tracing::error!("Failed to connect to {}: {}", url, source);
            self.stats.increment(stats::METRIC_ERROR_ON_CONNECT, 1, &tags);
            Error::BadGateway {
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        check_deprecation(path, &headers, Utc::now().naive_utc())?;

        let body = response.bytes().await.map_err(|source| {
            tracing::error!("Failed to read response body from {}: {}", url, source);
            Error::BadGateway {
                url: url.clone(),
                source,
            }
        })?;

        tags.insert("status".into(), status.to_string());

        if status < 400 {
            self.stats.increment(stats::METRIC_SUCCESS, 1, &tags);
            let payload = if body.is_empty() {
                None
            } else {
                serde_json::from_slice::<Value>(&body).ok()
            };

            let response = SuccessResponse::new(status, headers, payload);
            if response.has_error() {
                tracing::debug!("{} {} returned an error envelope", method, url);
                let headers = response.headers().clone();
                let payload = response.into_payload().unwrap_or(Value::Null);
                return Err(Error::ErrorResponse(ErrorResponse::new(status, headers, payload)));
            }
            return Ok(response);
        }

        self.stats.increment(stats::METRIC_ERROR, 1, &tags);
        let error = match serde_json::from_slice::<Value>(&body) {
            Ok(payload) => ErrorResponse::new(status, headers, payload),
            Err(_) => ErrorResponse::synthesized(status, headers, &String::from_utf8_lossy(&body)),
        };
        tracing::debug!("{} {} failed with status {}: {}", method, url, status, error);

        Err(match status {
            403 => Error::AuthenticationFailed(error),
            404 => Error::NotFound(error),
            s if s >= 500 => Error::ServiceUnavailable(error),
            _ => Error::ErrorResponse(error),
        })
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<SuccessResponse, Error> {
        self.execute(Method::Get, path, &options).await
    }

    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<SuccessResponse, Error> {
        self.execute(Method::Post, path, &options).await
    }

    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<SuccessResponse, Error> {
        self.execute(Method::Put, path, &options).await
    }

    pub async fn delete(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        self.execute(Method::Delete, path, &options).await
    }

    pub async fn options(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        self.execute(Method::Options, path, &options).await
    }

    pub async fn head(&self, path: &str, options: RequestOptions) -> Result<SuccessResponse, Error> {
        self.execute(Method::Head, path, &options).await
    }

    /// Repeats a request until `test_fn` returns true.
    ///
    /// `test_fn` receives the iteration index (from 0), the latest response
    /// and the context of the next request, which it may rewrite. Without a
    /// predicate exactly one request is made. When `max_iterations`
    /// predicate calls in a row return false the loop fails with
    /// [`Error::TooManyIterations`].
    pub async fn request_until<F>(
        &self,
        method: &str,
        path: &str,
        options: RequestOptions,
        until: UntilOptions,
        mut test_fn: Option<F>,
    ) -> Result<Vec<SuccessResponse>, Error>
    where
        F: FnMut(usize, &SuccessResponse, &mut RequestContext) -> bool,
    {
        let method: Method = method.parse()?;
        let mut context = RequestContext::new(method, path, options);
        let mut responses = Vec::new();
        let mut count = 0;

        loop {
            tracing::debug!("{} {} iteration {}", context.method, context.path, count);
            let response = self.execute_context(&context).await?;

            let stop = match test_fn.as_mut() {
                Some(f) => f(count, &response, &mut context),
                None => true,
            };
            responses.push(response);
            if stop {
                return Ok(responses);
            }

            count += 1;
            if let Some(max_iterations) = until.max_iterations {
                if count >= max_iterations {
                    return Err(Error::TooManyIterations {
                        method: method.to_string(),
                        path: path.to_string(),
                        max_iterations,
                    });
                }
            }

            if !until.request_delay.is_zero() {
                tokio::time::sleep(until.request_delay).await;
            }
        }
    }

    /// Pages through a GET endpoint with [`autopage`].
    pub async fn get_until(
        &self,
        path: &str,
        options: RequestOptions,
        until: UntilOptions,
    ) -> Result<Vec<SuccessResponse>, Error> {
        self.request_until("get", path, options, until, Some(autopage as UntilFn))
            .await
    }

    pub async fn post_until(
        &self,
        path: &str,
        options: RequestOptions,
        until: UntilOptions,
    ) -> Result<Vec<SuccessResponse>, Error> {
        self.request_until("post", path, options, until, Some(autopage as UntilFn))
            .await
    }

    pub async fn put_until(
        &self,
        path: &str,
        options: RequestOptions,
        until: UntilOptions,
    ) -> Result<Vec<SuccessResponse>, Error> {
        self.request_until("put", path, options, until, Some(autopage as UntilFn))
            .await
    }

    pub async fn delete_until(
        &self,
        path: &str,
        options: RequestOptions,
        until: UntilOptions,
    ) -> Result<Vec<SuccessResponse>, Error> {
        self.request_until("delete", path, options, until, Some(autopage as UntilFn))
            .await
    }

    pub async fn options_until(
        &self,
        path: &str,
        options: RequestOptions,
        until: UntilOptions,
    ) -> Result<Vec<SuccessResponse>, Error> {
        self.request_until("options", path, options, until, Some(autopage as UntilFn))
            .await
    }

    pub async fn head_until(
        &self,
        path: &str,
        options: RequestOptions,
        until: UntilOptions,
    ) -> Result<Vec<SuccessResponse>, Error> {
        self.request_until("head", path, options, until, Some(autopage as UntilFn))
            .await
    }
}

/// Default pagination predicate.
///
/// Advances the `offset` parameter by the page size (the `limit` parameter,
/// or the response's `ResultCount/Limit`) while more results remain.
/// Returns true to stop.
pub fn autopage(_iteration: usize, response: &SuccessResponse, context: &mut RequestContext) -> bool {
    let total = response.total_length();
    if response.offset() + 1 >= total {
        return true;
    }

    let limit = context
        .options
        .params
        .get("limit")
        .and_then(param_u64)
        .or_else(|| response.get("ResultCount/Limit").and_then(Value::as_u64));
    let limit = match limit {
        Some(limit) if limit > 0 => limit,
        _ => return true,
    };

    let params = context.params_mut();
    let next = match params.get("offset").and_then(Value::as_u64) {
        Some(offset) => offset + limit,
        None => limit,
    };
    params.insert("offset".to_string(), json!(next));

    next > total
}

fn param_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), Error> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::InvalidHeader(name.to_string()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.to_string()))?;
    headers.insert(header_name, header_value);
    Ok(())
}

fn scalar_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Flattens parameters into query pairs.
pub fn query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(v) = scalar_param(item) {
                        pairs.push((key.clone(), v));
                    }
                }
            }
            other => {
                if let Some(v) = scalar_param(other) {
                    pairs.push((key.clone(), v));
                }
            }
        }
    }
    pairs
}

fn parse_cutoff(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Inspects deprecation headers. Logs a warning for a deprecated endpoint
/// and fails once its cutoff (compared against `now`, UTC) has passed.
pub fn check_deprecation(path: &str, headers: &HeaderMap, now: NaiveDateTime) -> Result<(), Error> {
    let deprecated = headers
        .get(DEPRECATED_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        == Some("1");
    if !deprecated {
        return Ok(());
    }

    let raw_cutoff = headers
        .get(DEPRECATED_AFTER_HEADER)
        .and_then(|v| v.to_str().ok());
    let cutoff = raw_cutoff.and_then(parse_cutoff);
    if let (Some(raw), None) = (raw_cutoff, cutoff) {
        tracing::warn!("Ignoring unparseable {} header: {}", DEPRECATED_AFTER_HEADER, raw);
    }

    let mut message = format!("The API endpoint \"{}\" has been marked deprecated.", path);
    if let Some(cutoff) = cutoff {
        message.push_str(&format!(" It will stop working after {}.", cutoff));
    }
    tracing::warn!("{} Upgrade the performline client to stop seeing this message.", message);

    match cutoff {
        Some(cutoff) if cutoff < now => Err(Error::DeprecatedEndpoint { message, cutoff: Some(cutoff) }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn method_parsing() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Delete".parse::<Method>().unwrap(), Method::Delete);
        assert!(matches!("patch".parse::<Method>(), Err(Error::InvalidMethod(m)) if m == "patch"));
        assert_eq!(Method::Options.to_string(), "OPTIONS");
    }

    #[test]
    fn encoder_parsing_and_encoding() {
        assert_eq!("YAML".parse::<Encoder>().unwrap(), Encoder::Yaml);
        assert!("xml".parse::<Encoder>().is_err());

        let data = json!({"Name": "x"});
        assert_eq!(Encoder::Json.encode(&data).unwrap(), r#"{"Name":"x"}"#);
        assert_eq!(Encoder::Yaml.encode(&data).unwrap().trim(), "Name: x");
        assert_eq!(Encoder::None.encode(&json!("raw body")).unwrap(), "raw body");
    }

    #[test]
    fn make_url_joins_segments() {
        let client = RestClient::new("https://api.example.com/").unwrap();
        assert_eq!(client.make_url("/common/brands/"), "https://api.example.com/common/brands/");
        assert_eq!(client.make_url(""), "https://api.example.com/");

        let client = client.with_prefix("/v1/");
        assert_eq!(client.make_url("common/brands"), "https://api.example.com/v1/common/brands/");
        assert_eq!(client.make_url("/"), "https://api.example.com/v1/");
    }

    #[test]
    fn instance_defaults_win() {
        let client = RestClient::new("http://localhost")
            .unwrap()
            .with_header("Authorization", "Token abc")
            .with_param("format", "json");

        let options = RequestOptions::new()
            .with_header("authorization", "Token caller")
            .with_header("X-Trace", "1")
            .with_param("format", "xml")
            .with_param("limit", 5);

        let headers = client.build_headers(&options).unwrap();
        assert_eq!(headers.get("authorization").unwrap(), "Token abc");
        assert_eq!(headers.get("x-trace").unwrap(), "1");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), DEFAULT_CONTENT_TYPE);

        let params = client.merge_params(&options);
        assert_eq!(params["format"], json!("json"));
        assert_eq!(params["limit"], json!(5));
    }

    #[test]
    fn per_call_content_type_beats_caller_header() {
        let client = RestClient::new("http://localhost").unwrap();
        let options = RequestOptions::new()
            .with_header("Content-Type", "text/plain")
            .with_content_type("application/x-yaml");
        let headers = client.build_headers(&options).unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/x-yaml");

        let client = client.with_content_type(None);
        let headers = client.build_headers(&RequestOptions::new()).unwrap();
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn invalid_header_is_rejected() {
        let client = RestClient::new("http://localhost").unwrap();
        let options = RequestOptions::new().with_header("bad header", "x");
        assert!(matches!(client.build_headers(&options), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn query_pairs_flatten_values() {
        let mut params = Params::new();
        params.insert("active".into(), json!(true));
        params.insert("hidden".into(), json!(false));
        params.insert("skip".into(), Value::Null);
        params.insert("id".into(), json!([1, 2]));
        params.insert("limit".into(), json!(10));

        assert_eq!(
            query_pairs(&params),
            vec![
                ("active".to_string(), "true".to_string()),
                ("hidden".to_string(), "false".to_string()),
                ("id".to_string(), "1".to_string()),
                ("id".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    fn page(total: u64, offset: u64, limit: Option<u64>) -> SuccessResponse {
        let mut count = json!({"Total": total, "Offset": offset});
        if let Some(limit) = limit {
            count["Limit"] = json!(limit);
        }
        SuccessResponse::from_payload(json!({"Status": "success", "ResultCount": count}))
    }

    #[test]
    fn autopage_advances_offset() {
        let mut ctx = RequestContext::new(Method::Get, "x", RequestOptions::new().with_param("limit", 1));

        assert!(!autopage(0, &page(3, 0, Some(1)), &mut ctx));
        assert_eq!(ctx.options.params["offset"], json!(1));
        assert!(!autopage(1, &page(3, 1, Some(1)), &mut ctx));
        assert_eq!(ctx.options.params["offset"], json!(2));
        assert!(autopage(2, &page(3, 2, Some(1)), &mut ctx));
    }

    #[test]
    fn autopage_uses_response_limit() {
        let mut ctx = RequestContext::new(Method::Get, "x", RequestOptions::new());
        assert!(!autopage(0, &page(10, 0, Some(4)), &mut ctx));
        assert_eq!(ctx.options.params["offset"], json!(4));
    }

    #[test]
    fn autopage_stops_without_limit() {
        let mut ctx = RequestContext::new(Method::Get, "x", RequestOptions::new());
        let response = SuccessResponse::from_payload(json!({"ResultCount": {"Total": 10}}));
        assert!(autopage(0, &response, &mut ctx));
        assert!(!ctx.options.params.contains_key("offset"));
    }

    #[test]
    fn autopage_stops_past_total() {
        let mut ctx = RequestContext::new(
            Method::Get,
            "x",
            RequestOptions::new().with_param("limit", 4).with_param("offset", 8),
        );
        assert!(autopage(0, &page(10, 8, Some(4)), &mut ctx));
        assert_eq!(ctx.options.params["offset"], json!(12));
    }

    #[test]
    fn deprecation_without_header_passes() {
        assert!(check_deprecation("x", &HeaderMap::new(), at(2030, 1, 1)).is_ok());
    }

    #[test]
    fn deprecation_before_cutoff_warns_only() {
        let mut headers = HeaderMap::new();
        headers.insert(DEPRECATED_HEADER, HeaderValue::from_static("1"));
        headers.insert(DEPRECATED_AFTER_HEADER, HeaderValue::from_static("2030-01-01T00:00:00.000000"));
        assert!(check_deprecation("x", &headers, at(2029, 6, 1)).is_ok());
    }

    #[test]
    fn deprecation_after_cutoff_fails() {
        let mut headers = HeaderMap::new();
        headers.insert(DEPRECATED_HEADER, HeaderValue::from_static("1"));
        headers.insert(DEPRECATED_AFTER_HEADER, HeaderValue::from_static("2020-01-01T00:00:00Z"));

        match check_deprecation("common/brands", &headers, at(2021, 1, 1)) {
            Err(Error::DeprecatedEndpoint { message, cutoff }) => {
                assert!(message.contains("common/brands"));
                assert_eq!(cutoff, Some(at(2020, 1, 1)));
            }
            other => panic!("expected DeprecatedEndpoint, got {:?}", other),
        }
    }

    #[test]
    fn deprecation_with_bad_date_has_no_cutoff() {
        let mut headers = HeaderMap::new();
        headers.insert(DEPRECATED_HEADER, HeaderValue::from_static("1"));
        headers.insert(DEPRECATED_AFTER_HEADER, HeaderValue::from_static("next tuesday"));
        assert!(check_deprecation("x", &headers, at(2100, 1, 1)).is_ok());
    }
}
