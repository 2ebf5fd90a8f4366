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

//! An async HTTP client running on tokio.
//!
//! The client has the same contract as the blocking one. The request and the delay between
//! attempts both yield to the runtime, and dropping the returned future cancels the call.
//!
//! ```no_run
//! use utilforth::http::AsyncHttpClient;
//! use utilforth::http::HttpConfig;
//! use utilforth::http::RequestOptions;
//!
//! # async fn run() -> Result<(), utilforth::Error> {
//! let mut client = AsyncHttpClient::new(HttpConfig::builder("https://httpbin.org").build())?;
//! let outcome = client.get("/get", RequestOptions::new()).await;
//! assert!(outcome.is_success());
//! client.close().await;
//! # Ok(())
//! # }
//! ```

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::Error;
use crate::http::HttpConfig;
use crate::http::HttpRequest;
use crate::http::HttpResponse;
use crate::http::Method;
use crate::http::Outcome;
use crate::http::RequestBody;
use crate::http::RequestOptions;
use crate::http::settle;
use crate::http::transport_error;
use crate::http::warn_attempt;

/// Sends a single request and returns the raw response.
///
/// An `Err` means no response was received; it is the only kind of failure the client retries.
#[async_trait]
pub trait AsyncTransport: fmt::Debug + Send + Sync + 'static {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;

    /// Release held connections.
    async fn close(&mut self) {}
}

/// An [`AsyncTransport`] backed by `reqwest`'s async client.
#[derive(Debug)]
pub struct AsyncReqwestTransport {
    session: Option<Client>,
}

impl AsyncReqwestTransport {
    /// Create a transport, opening a session when `use_session` is set.
    pub fn new(use_session: bool) -> Result<Self, Error> {
        let session = if use_session {
            log::debug!("opening async http session");
            Some(new_client()?)
        } else {
            None
        };
        Ok(Self { session })
    }

    /// Whether a persistent session is currently held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait]
impl AsyncTransport for AsyncReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        match &self.session {
            Some(client) => execute(client, request).await,
            None => {
                let client = new_client()?;
                execute(&client, request).await
            }
        }
    }

    async fn close(&mut self) {
        if self.session.take().is_some() {
            log::debug!("closed async http session");
        }
    }
}

fn new_client() -> Result<Client, Error> {
    Client::builder()
        .build()
        .map_err(|err| Error::new("failed to build http client").with_source(err))
}

async fn execute(client: &Client, request: &HttpRequest) -> Result<HttpResponse, Error> {
    let mut builder = client
        .request(request.method.into(), &request.url)
        .timeout(request.timeout);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    builder = match &request.body {
        Some(RequestBody::Json(value)) => builder.json(value),
        Some(RequestBody::Form(fields)) => builder.form(fields),
        Some(RequestBody::Text(text)) => builder.body(text.clone()),
        None => builder,
    };

    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = response.bytes().await.map_err(transport_error)?.to_vec();

    Ok(HttpResponse {
        status,
        content_type,
        body,
    })
}

/// An async HTTP client with default headers, timeout and a bounded retry loop.
#[derive(Debug)]
pub struct AsyncHttpClient<T: AsyncTransport = AsyncReqwestTransport> {
    config: HttpConfig,
    transport: T,
}

impl AsyncHttpClient {
    /// Create a client sending requests through `reqwest`.
    pub fn new(config: HttpConfig) -> Result<Self, Error> {
        let transport = AsyncReqwestTransport::new(config.use_session())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: AsyncTransport> AsyncHttpClient<T> {
    /// Create a client sending requests through a custom transport.
    pub fn with_transport(config: HttpConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> Outcome {
        self.request(Method::Get, url, options).await
    }

    pub async fn post(&self, url: &str, options: RequestOptions) -> Outcome {
        self.request(Method::Post, url, options).await
    }

    pub async fn put(&self, url: &str, options: RequestOptions) -> Outcome {
        self.request(Method::Put, url, options).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Outcome {
        self.request(Method::Delete, url, options).await
    }

    /// Send a request, retrying transport failures.
    pub async fn request(&self, method: Method, url: &str, options: RequestOptions) -> Outcome {
        let request = self.config.prepare(method, url, options);
        let total = self.config.attempts();

        let mut attempt = 1;
        loop {
            match self.transport.send(&request).await {
                Ok(response) => return settle(&request, response),
                Err(err) => {
                    warn_attempt(&request, attempt, total, &err);
                    if attempt >= total {
                        return Outcome::Failure {
                            status_code: None,
                            error: err.to_string(),
                        };
                    }
                }
            }
            tokio::time::sleep(self.config.retry_delay()).await;
            attempt += 1;
        }
    }

    /// Close the session held by the transport. Later calls still work without one.
    pub async fn close(&mut self) {
        self.transport.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::http::Body;

    #[derive(Debug)]
    struct FlakyTransport {
        attempts: Arc<AtomicUsize>,
        failures: usize,
        response: HttpResponse,
    }

    impl FlakyTransport {
        fn new(failures: usize, response: HttpResponse) -> Self {
            Self {
                attempts: Arc::new(AtomicUsize::new(0)),
                failures,
                response,
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AsyncTransport for FlakyTransport {
        async fn send(&self, _: &HttpRequest) -> Result<HttpResponse, Error> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(Error::new("failed to connect"))
            } else {
                Ok(self.response.clone())
            }
        }
    }

    fn config(retry: usize, delay: Duration) -> HttpConfig {
        HttpConfig::builder("https://example.com")
            .retry(retry)
            .retry_delay(delay)
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let delay = Duration::from_millis(500);
        let transport = FlakyTransport::new(2, HttpResponse::json(200, &json!({"ok": true})));
        let client = AsyncHttpClient::with_transport(config(2, delay), transport);

        let start = Instant::now();
        let outcome = client.get("status", RequestOptions::new()).await;

        assert_eq!(client.transport().attempts(), 3);
        assert!(start.elapsed() >= delay * 2);
        assert!(start.elapsed() < delay * 3);
        assert_eq!(outcome.data(), Some(&Body::Json(json!({"ok": true}))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_sleep_once_per_retry() {
        let delay = Duration::from_millis(500);
        let transport = FlakyTransport::new(usize::MAX, HttpResponse::text(200, "unused"));
        let client = AsyncHttpClient::with_transport(config(1, delay), transport);

        let start = Instant::now();
        let outcome = client.post("items", RequestOptions::new()).await;

        assert_eq!(client.transport().attempts(), 2);
        assert!(start.elapsed() >= delay);
        assert!(start.elapsed() < delay * 2);
        assert_eq!(
            outcome,
            Outcome::Failure {
                status_code: None,
                error: "failed to connect".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_is_not_retried() {
        let transport = FlakyTransport::new(0, HttpResponse::text(503, "busy"));
        let client = AsyncHttpClient::with_transport(config(2, Duration::from_secs(1)), transport);

        let start = Instant::now();
        let outcome = client.put("items/1", RequestOptions::new()).await;

        assert_eq!(client.transport().attempts(), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(outcome.status_code(), Some(503));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_close_drops_session() {
        let transport = AsyncReqwestTransport::new(true).unwrap();
        let mut client =
            AsyncHttpClient::with_transport(HttpConfig::builder("").build(), transport);
        assert!(client.transport().has_session());
        client.close().await;
        assert!(!client.transport().has_session());
    }
}
