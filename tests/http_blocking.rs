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
use utilforth::http::Body;
use utilforth::http::HttpConfig;
use utilforth::http::RequestOptions;
use utilforth::http::SyncHttpClient;

fn client(base_url: &str) -> SyncHttpClient {
    let config = HttpConfig::builder(base_url)
        .default_header("User-Agent", "MyApp/1.0")
        .default_header("Accept", "*/*")
        .retry(1)
        .retry_delay(Duration::from_millis(10))
        .build();
    SyncHttpClient::new(config).unwrap()
}

#[test]
fn test_get_json_with_query_and_headers() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/get")
        .match_query(Matcher::UrlEncoded("q".into(), "test".into()))
        .match_header("user-agent", "MyApp/1.0")
        .match_header("accept", "application/json")
        .with_header("content-type", "application/json")
        .with_body(r#"{"args": {"q": "test"}}"#)
        .create();

    let client = client(&server.url());
    let outcome = client.get(
        "/get",
        RequestOptions::new()
            .query("q", "test")
            .header("Accept", "application/json"),
    );

    mock.assert();
    assert!(outcome.is_success());
    assert_eq!(outcome.status_code(), Some(200));
    assert_eq!(
        outcome.data(),
        Some(&Body::Json(json!({"args": {"q": "test"}})))
    );
}

#[test]
fn test_per_call_header_replaces_default_of_any_case() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/whoami")
        .match_header("user-agent", "percall/2.0")
        .with_body("ok")
        .create();

    let client = client(&server.url());
    let outcome = client.get(
        "whoami",
        RequestOptions::new().header("user-agent", "percall/2.0"),
    );

    mock.assert();
    assert!(outcome.is_success());
}

#[test]
fn test_post_json_and_text_response() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/post")
        .match_body(Matcher::Json(json!({"name": "alice"})))
        .with_status(201)
        .with_header("content-type", "text/plain")
        .with_body("created")
        .create();

    let client = client(&format!("{}/", server.url()));
    let outcome = client.post("post", RequestOptions::new().json(json!({"name": "alice"})));

    mock.assert();
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"success": true, "status_code": 201, "data": "created"})
    );
}

#[test]
fn test_put_form_and_delete() {
    let mut server = mockito::Server::new();
    let put = server
        .mock("PUT", "/items/1")
        .match_body(Matcher::UrlEncoded("name".into(), "bob".into()))
        .with_status(204)
        .create();
    let delete = server.mock("DELETE", "/items/1").with_status(200).create();

    let client = client(&server.url());
    let outcome = client.put("items/1", RequestOptions::new().form([("name", "bob")]));
    assert_eq!(outcome.status_code(), Some(204));
    assert_eq!(outcome.data(), Some(&Body::Text(String::new())));

    assert!(client.delete("items/1", RequestOptions::new()).is_success());
    put.assert();
    delete.assert();
}

#[test]
fn test_not_found_is_not_retried() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .expect(1)
        .create();

    let client = client(&server.url());
    let outcome = client.get("missing", RequestOptions::new());

    mock.assert();
    assert!(!outcome.is_success());
    assert_eq!(outcome.status_code(), Some(404));
    assert!(outcome.error().unwrap().contains("404"));
}

#[test]
fn test_server_error_is_not_retried() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/flaky")
        .with_status(500)
        .expect(1)
        .create();

    let client = client(&server.url());
    let outcome = client.get("flaky", RequestOptions::new());

    mock.assert();
    assert_eq!(outcome.status_code(), Some(500));
}

#[test]
fn test_malformed_json_is_a_failure() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/broken")
        .with_header("content-type", "application/json")
        .with_body("{not json")
        .expect(1)
        .create();

    let client = client(&server.url());
    let outcome = client.get("broken", RequestOptions::new());

    mock.assert();
    assert!(!outcome.is_success());
    assert_eq!(outcome.status_code(), Some(200));
}

#[test]
fn test_connection_refused_exhausts_retries() {
    let client = client("http://127.0.0.1:1");
    let outcome = client.get("unreachable", RequestOptions::new());

    assert!(!outcome.is_success());
    assert_eq!(outcome.status_code(), None);
    assert!(outcome.error().is_some());
}

#[test]
fn test_requests_after_close_and_without_session() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/ping").with_body("pong").expect(2).create();

    let mut client = client(&server.url());
    client.close();
    assert!(!client.transport().has_session());
    assert!(client.get("ping", RequestOptions::new()).is_success());

    let config = HttpConfig::builder(server.url()).use_session(false).build();
    let client = SyncHttpClient::new(config).unwrap();
    assert_eq!(
        client.get("ping", RequestOptions::new()).data(),
        Some(&Body::Text("pong".to_string()))
    );

    mock.assert();
}
