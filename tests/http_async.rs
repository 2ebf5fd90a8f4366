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

use std::time::Duration;

use mockito::Matcher;
use serde_json::json;
use utilforth::http::AsyncHttpClient;
use utilforth::http::Body;
use utilforth::http::HttpConfig;
use utilforth::http::RequestOptions;

fn client(base_url: &str) -> AsyncHttpClient {
    let config = HttpConfig::builder(base_url)
        .default_header("User-Agent", "MyApp/1.0")
        .retry(1)
        .retry_delay(Duration::from_millis(10))
        .build();
    AsyncHttpClient::new(config).unwrap()
}

#[tokio::test]
async fn test_get_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/get")
        .match_query(Matcher::UrlEncoded("q".into(), "test".into()))
        .match_header("user-agent", "MyApp/1.0")
        .with_header("content-type", "application/json; charset=utf-8")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let client = client(&server.url());
    let outcome = client.get("get", RequestOptions::new().query("q", "test")).await;

    mock.assert_async().await;
    assert_eq!(outcome.data(), Some(&Body::Json(json!({"ok": true}))));
}

#[tokio::test]
async fn test_post_text_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/echo")
        .match_body("hello")
        .with_body("hello back")
        .create_async()
        .await;

    let client = client(&server.url());
    let outcome = client
        .post("/echo", RequestOptions::new().text("hello"))
        .await;

    mock.assert_async().await;
    assert_eq!(outcome.data(), Some(&Body::Text("hello back".to_string())));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/items/9")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let client = client(&server.url());
    let outcome = client.delete("items/9", RequestOptions::new()).await;

    mock.assert_async().await;
    assert_eq!(
        serde_json::to_value(&outcome).unwrap()["status_code"],
        json!(404)
    );
    assert_eq!(serde_json::to_value(&outcome).unwrap()["success"], json!(false));
}

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    let client = client("http://127.0.0.1:1");
    let outcome = client.put("unreachable", RequestOptions::new()).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.status_code(), None);
}

#[tokio::test]
async fn test_session_less_client_after_close() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/ping")
        .with_body("pong")
        .expect(2)
        .create_async()
        .await;

    let mut client = client(&server.url());
    assert!(client.get("ping", RequestOptions::new()).await.is_success());
    client.close().await;
    assert!(client.get("ping", RequestOptions::new()).await.is_success());

    mock.assert_async().await;
}
