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

//! A blocking HTTP client.
//!
//! ```no_run
//! use serde_json::json;
//! use utilforth::http::HttpConfig;
//! use utilforth::http::RequestOptions;
//! use utilforth::http::SyncHttpClient;
//!
//! let config = HttpConfig::builder("https://httpbin.org")
//!     .default_header("User-Agent", "MyApp/1.0")
//!     .build();
//! let mut client = SyncHttpClient::new(config).unwrap();
//!
//! let outcome = client.get("/get", RequestOptions::new().query("q", "test"));
//! println!("GET: {:?}", outcome.data());
//!
//! let outcome = client.post("/post", RequestOptions::new().json(json!({"name": "alice"})));
//! println!("POST: {}", serde_json::to_string(&outcome).unwrap());
//!
//! client.close();
//! ```

use std::fmt;
use std::thread;

use reqwest::blocking::Client;
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
pub trait Transport: fmt::Debug + Send + Sync + 'static {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;

    /// Release held connections.
    fn close(&mut self) {}
}

/// A [`Transport`] backed by `reqwest`'s blocking client.
#[derive(Debug)]
pub struct ReqwestTransport {
    session: Option<Client>,
}

impl ReqwestTransport {
    /// Create a transport, opening a session when `use_session` is set.
    pub fn new(use_session: bool) -> Result<Self, Error> {
        let session = if use_session {
            log::debug!("opening http session");
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

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        match &self.session {
            Some(client) => execute(client, request),
            None => {
                let client = new_client()?;
                execute(&client, request)
            }
        }
    }

    fn close(&mut self) {
        if self.session.take().is_some() {
            log::debug!("closed http session");
        }
    }
}

fn new_client() -> Result<Client, Error> {
    Client::builder()
        .build()
        .map_err(|err| Error::new("failed to build http client").with_source(err))
}

fn execute(client: &Client, request: &HttpRequest) -> Result<HttpResponse, Error> {
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

    let response = builder.send().map_err(transport_error)?;
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = response.bytes().map_err(transport_error)?.to_vec();

    Ok(HttpResponse {
        status,
        content_type,
        body,
    })
}

/// A blocking HTTP client with default headers, timeout and a bounded retry loop.
///
/// Every call occupies the calling thread for all of its attempts and the delays between them.
#[derive(Debug)]
pub struct SyncHttpClient<T: Transport = ReqwestTransport> {
    config: HttpConfig,
    transport: T,
}

impl SyncHttpClient {
    /// Create a client sending requests through `reqwest`.
    pub fn new(config: HttpConfig) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(config.use_session())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> SyncHttpClient<T> {
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

    pub fn get(&self, url: &str, options: RequestOptions) -> Outcome {
        self.request(Method::Get, url, options)
    }

    pub fn post(&self, url: &str, options: RequestOptions) -> Outcome {
        self.request(Method::Post, url, options)
    }

    pub fn put(&self, url: &str, options: RequestOptions) -> Outcome {
        self.request(Method::Put, url, options)
    }

    pub fn delete(&self, url: &str, options: RequestOptions) -> Outcome {
        self.request(Method::Delete, url, options)
    }

    /// Send a request, retrying transport failures.
    pub fn request(&self, method: Method, url: &str, options: RequestOptions) -> Outcome {
        let request = self.config.prepare(method, url, options);
        let total = self.config.attempts();

        let mut attempt = 1;
        loop {
            match self.transport.send(&request) {
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
            thread::sleep(self.config.retry_delay());
            attempt += 1;
        }
    }

    /// Close the session held by the transport. Later calls still work without one.
    pub fn close(&mut self) {
        self.transport.close();
    }
}
