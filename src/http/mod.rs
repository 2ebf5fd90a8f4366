// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP clients with default headers, timeouts, optional session reuse and a bounded retry loop.
//!
//! [`SyncHttpClient`] blocks the calling thread; [`AsyncHttpClient`] runs on tokio. Both make
//! `retry + 1` attempts with a fixed delay in between and report the result as an [`Outcome`]
//! rather than an error:
//!
//! - a transport failure (connection, DNS, timeout) is logged with `log::warn!` and retried; once
//!   the attempts are exhausted it becomes a failure without a status code;
//! - a `4xx`/`5xx` response is a failure carrying the status code, and is never retried;
//! - a response body that does not decode is a failure carrying the status code;
//! - anything else is a success with a [`Body`] decoded according to its content type.
//!
//! The network is reached through the [`blocking::Transport`] and
//! [`asynchronous::AsyncTransport`] traits, so the retry behavior can be exercised without
//! sockets.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::Error;

#[cfg(feature = "http-async")]
pub mod asynchronous;
#[cfg(feature = "http-blocking")]
pub mod blocking;

#[cfg(feature = "http-async")]
pub use self::asynchronous::AsyncHttpClient;
#[cfg(feature = "http-blocking")]
pub use self::blocking::SyncHttpClient;

/// Header names and values, ordered by name.
pub type Headers = BTreeMap<String, String>;

/// The HTTP methods the clients issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Resolve `url` against `base`.
///
/// URLs starting with `http://` or `https://` are used verbatim. Anything else is joined to the
/// base with exactly one `/`.
///
/// ```
/// use utilforth::http::resolve_url;
///
/// assert_eq!(resolve_url("https://example.com", "get"), "https://example.com/get");
/// assert_eq!(resolve_url("https://example.com/", "/get"), "https://example.com/get");
/// assert_eq!(resolve_url("https://example.com", "http://other.org/x"), "http://other.org/x");
/// ```
pub fn resolve_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

/// Merge per-call headers over the defaults; on a name clash the per-call value wins.
///
/// Header names compare case-insensitively, and the per-call spelling is kept.
///
/// ```
/// use utilforth::http::Headers;
/// use utilforth::http::merge_headers;
///
/// let defaults = Headers::from([("User-Agent".to_string(), "app/1.0".to_string())]);
/// let per_call = Headers::from([("user-agent".to_string(), "cli/2.0".to_string())]);
///
/// let merged = merge_headers(&defaults, &per_call);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged["user-agent"], "cli/2.0");
/// ```
pub fn merge_headers(defaults: &Headers, per_call: &Headers) -> Headers {
    let mut headers = defaults.clone();
    for (name, value) in per_call {
        insert_header(&mut headers, name.clone(), value.clone());
    }
    headers
}

// Replace any header whose name differs only in case.
fn insert_header(headers: &mut Headers, name: String, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

/// A request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON with a `application/json` content type.
    Json(serde_json::Value),
    /// Serialized as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Sent as is.
    Text(String),
}

/// Per-call options layered over the client configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: Headers,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, overriding a default header of the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Send a JSON body.
    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    /// Send a form-encoded body.
    #[must_use]
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.body = Some(RequestBody::Form(fields));
        self
    }

    /// Send a plain text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(text.into()));
        self
    }

    /// Override the configured timeout for this call.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// How a response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Text,
}

impl BodyKind {
    /// `Json` when the content type mentions `application/json`, `Text` otherwise.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(value) if value.contains("application/json") => BodyKind::Json,
            _ => BodyKind::Text,
        }
    }

    /// Decode raw body bytes. Text is decoded lossily and never fails.
    pub fn decode(&self, bytes: &[u8]) -> Result<Body, Error> {
        match self {
            BodyKind::Json => serde_json::from_slice(bytes).map(Body::Json).map_err(|err| {
                Error::new("failed to decode response body")
                    .with_context("kind", "json")
                    .with_source(err)
            }),
            BodyKind::Text => Ok(Body::Text(String::from_utf8_lossy(bytes).into_owned())),
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Json(_) => None,
            Body::Text(text) => Some(text),
        }
    }
}

/// The result of a request after all attempts.
///
/// Serializes to `{"success": true, "status_code": 200, "data": ...}` or
/// `{"success": false, "status_code": 404, "error": "..."}`, with a `null` status code when no
/// response was received.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        status_code: u16,
        data: Body,
    },
    Failure {
        status_code: Option<u16>,
        error: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The response status, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Outcome::Success { status_code, .. } => Some(*status_code),
            Outcome::Failure { status_code, .. } => *status_code,
        }
    }

    pub fn data(&self) -> Option<&Body> {
        match self {
            Outcome::Success { data, .. } => Some(data),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(3))?;
        match self {
            Outcome::Success { status_code, data } => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("status_code", status_code)?;
                map.serialize_entry("data", data)?;
            }
            Outcome::Failure { status_code, error } => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("status_code", status_code)?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

/// A fully resolved request handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Duration,
}

/// A raw response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_owned),
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, Some("application/json"), value.to_string())
    }

    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self::new(status, Some("text/plain; charset=utf-8"), text.into())
    }
}

/// Configuration shared by both HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    base_url: String,
    default_headers: Headers,
    timeout: Duration,
    retry: usize,
    retry_delay: Duration,
    use_session: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_headers: Headers::new(),
            timeout: HttpConfig::DEFAULT_TIMEOUT,
            retry: HttpConfig::DEFAULT_RETRY,
            retry_delay: HttpConfig::DEFAULT_RETRY_DELAY,
            use_session: true,
        }
    }
}

impl HttpConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_RETRY: usize = 2;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

    /// Create a new [`HttpConfigBuilder`] for the given base URL.
    pub fn builder(base_url: impl Into<String>) -> HttpConfigBuilder {
        HttpConfigBuilder::new(base_url)
    }

    /// The base URL with trailing slashes removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of retries after the first attempt.
    pub fn retry(&self) -> usize {
        self.retry
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Whether one client session is kept for the lifetime of the HTTP client.
    pub fn use_session(&self) -> bool {
        self.use_session
    }

    pub(crate) fn attempts(&self) -> usize {
        self.retry.saturating_add(1)
    }

    pub(crate) fn prepare(&self, method: Method, url: &str, options: RequestOptions) -> HttpRequest {
        HttpRequest {
            method,
            url: resolve_url(&self.base_url, url),
            headers: merge_headers(&self.default_headers, &options.headers),
            query: options.query,
            body: options.body,
            timeout: options.timeout.unwrap_or(self.timeout),
        }
    }
}

/// A builder for [`HttpConfig`].
#[must_use = "call `build` to construct the config"]
#[derive(Debug)]
pub struct HttpConfigBuilder {
    config: HttpConfig,
}

impl HttpConfigBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            config: HttpConfig {
                base_url,
                ..HttpConfig::default()
            },
        }
    }

    /// Add a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.config.default_headers, name.into(), value.into());
        self
    }

    /// Set the timeout of each attempt.
    ///
    /// Default to 10 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of retries after the first attempt.
    ///
    /// Default to 2.
    pub fn retry(mut self, retry: usize) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the fixed delay between attempts.
    ///
    /// Default to 500 milliseconds.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Set whether a persistent session is kept.
    ///
    /// Default to `true`.
    pub fn use_session(mut self, use_session: bool) -> Self {
        self.config.use_session = use_session;
        self
    }

    pub fn build(self) -> HttpConfig {
        self.config
    }
}

// Turn a received response into an outcome. Error statuses and undecodable bodies are final.
pub(crate) fn settle(request: &HttpRequest, response: HttpResponse) -> Outcome {
    let status_code = response.status;
    if status_code >= 400 {
        return Outcome::Failure {
            status_code: Some(status_code),
            error: status_error(status_code, &request.url),
        };
    }

    let kind = BodyKind::from_content_type(response.content_type.as_deref());
    match kind.decode(&response.body) {
        Ok(data) => Outcome::Success { status_code, data },
        Err(err) => Outcome::Failure {
            status_code: Some(status_code),
            error: err.to_string(),
        },
    }
}

pub(crate) fn warn_attempt(request: &HttpRequest, attempt: usize, total: usize, err: &Error) {
    log::warn!(
        "[{}] request failed [{attempt}/{total}]: {} -> {err}",
        request.method,
        request.url
    );
}

pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let message = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "failed to connect"
    } else {
        "failed to send request"
    };
    Error::new(message).with_source(err)
}

fn status_error(status_code: u16, url: &str) -> String {
    let kind = if status_code < 500 {
        "client"
    } else {
        "server"
    };
    match StatusCode::from_u16(status_code)
        .ok()
        .and_then(|status| status.canonical_reason())
    {
        Some(reason) => format!("HTTP status {kind} error ({status_code} {reason}) for url ({url})"),
        None => format!("HTTP status {kind} error ({status_code}) for url ({url})"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://example.com", "get"),
            "https://example.com/get"
        );
        assert_eq!(
            resolve_url("https://example.com/", "//get"),
            "https://example.com/get"
        );
        assert_eq!(resolve_url("", "get"), "/get");
        assert_eq!(
            resolve_url("https://example.com", "https://other.org/a?b=1"),
            "https://other.org/a?b=1"
        );
        // only a full scheme prefix makes a URL absolute
        assert_eq!(
            resolve_url("https://example.com", "httpbin/get"),
            "https://example.com/httpbin/get"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = HttpConfig::builder("https://example.com///").build();
        assert_eq!(config.base_url(), "https://example.com");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.retry(), 2);
        assert_eq!(config.retry_delay(), Duration::from_millis(500));
        assert!(config.use_session());
        assert!(config.default_headers().is_empty());
    }

    #[test]
    fn test_prepare_merges_headers_and_timeout() {
        let config = HttpConfig::builder("https://example.com")
            .default_header("User-Agent", "app/1.0")
            .default_header("Accept", "*/*")
            .build();

        let request = config.prepare(
            Method::Post,
            "/items",
            RequestOptions::new()
                .header("Accept", "application/json")
                .query("page", 2)
                .json(json!({"name": "alice"}))
                .timeout(Duration::from_secs(1)),
        );

        assert_eq!(request.url, "https://example.com/items");
        assert_eq!(request.headers["User-Agent"], "app/1.0");
        assert_eq!(request.headers["Accept"], "application/json");
        assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(request.timeout, Duration::from_secs(1));
        assert_eq!(
            request.body,
            Some(RequestBody::Json(json!({"name": "alice"})))
        );

        let request = config.prepare(Method::Get, "items", RequestOptions::new());
        assert_eq!(request.timeout, HttpConfig::DEFAULT_TIMEOUT);
        assert_eq!(request.headers["Accept"], "*/*");
    }

    #[test]
    fn test_header_names_merge_case_insensitively() {
        let config = HttpConfig::builder("https://example.com")
            .default_header("User-Agent", "default/1.0")
            .default_header("X-Trace", "a")
            .default_header("x-trace", "b")
            .build();
        assert_eq!(config.default_headers().len(), 2);
        assert_eq!(config.default_headers()["x-trace"], "b");

        let request = config.prepare(
            Method::Get,
            "get",
            RequestOptions::new()
                .header("USER-AGENT", "ignored/0.1")
                .header("user-agent", "percall/2.0"),
        );
        assert_eq!(
            request.headers,
            Headers::from([
                ("user-agent".to_string(), "percall/2.0".to_string()),
                ("x-trace".to_string(), "b".to_string()),
            ])
        );
    }

    #[test]
    fn test_attempts_saturate() {
        let config = HttpConfig::builder("").retry(usize::MAX).build();
        assert_eq!(config.attempts(), usize::MAX);
        assert_eq!(HttpConfig::default().attempts(), 3);
    }

    #[test]
    fn test_body_kind() {
        assert_eq!(
            BodyKind::from_content_type(Some("application/json; charset=utf-8")),
            BodyKind::Json
        );
        assert_eq!(
            BodyKind::from_content_type(Some("text/html")),
            BodyKind::Text
        );
        assert_eq!(BodyKind::from_content_type(None), BodyKind::Text);

        assert_eq!(
            BodyKind::Json.decode(br#"{"a":1}"#).unwrap(),
            Body::Json(json!({"a": 1}))
        );
        assert!(BodyKind::Json.decode(b"not json").is_err());
        assert_eq!(
            BodyKind::Text.decode(b"plain").unwrap(),
            Body::Text("plain".to_string())
        );
    }

    #[test]
    fn test_settle() {
        let config = HttpConfig::builder("https://example.com").build();
        let request = config.prepare(Method::Get, "missing", RequestOptions::new());

        let outcome = settle(&request, HttpResponse::text(404, "nope"));
        assert_eq!(outcome.status_code(), Some(404));
        assert_eq!(
            outcome.error(),
            Some("HTTP status client error (404 Not Found) for url (https://example.com/missing)")
        );

        let outcome = settle(
            &request,
            HttpResponse::new(200, Some("application/json"), "{broken"),
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.status_code(), Some(200));

        let outcome = settle(&request, HttpResponse::json(201, &json!([1, 2])));
        assert!(outcome.is_success());
        assert_eq!(outcome.data(), Some(&Body::Json(json!([1, 2]))));
    }

    #[test]
    fn test_outcome_serialization() {
        let success = Outcome::Success {
            status_code: 200,
            data: Body::Text("ok".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({"success": true, "status_code": 200, "data": "ok"})
        );

        let failure = Outcome::Failure {
            status_code: None,
            error: "failed to connect".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({"success": false, "status_code": null, "error": "failed to connect"})
        );
    }
}
