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

//! Async requests against httpbin.org, creating a client per call.

use serde_json::json;
use utilforth::http::AsyncHttpClient;
use utilforth::http::HttpConfig;
use utilforth::http::RequestOptions;

#[tokio::main]
async fn main() -> Result<(), utilforth::Error> {
    let config = HttpConfig::builder("https://httpbin.org")
        .default_header("User-Agent", "MyAsyncApp/1.0")
        .retry(2)
        .use_session(false)
        .build();
    let mut client = AsyncHttpClient::new(config)?;

    let outcome = client
        .get("/get", RequestOptions::new().query("q", "async"))
        .await;
    println!("GET: {}", serde_json::to_string(&outcome).unwrap_or_default());

    let outcome = client
        .post("/post", RequestOptions::new().json(json!({"name": "bob"})))
        .await;
    println!("POST: {}", serde_json::to_string(&outcome).unwrap_or_default());

    client.close().await;
    Ok(())
}
