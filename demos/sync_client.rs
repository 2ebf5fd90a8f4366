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

//! Blocking requests against httpbin.org with a persistent session.

use serde_json::json;
use utilforth::http::HttpConfig;
use utilforth::http::RequestOptions;
use utilforth::http::SyncHttpClient;

fn main() -> Result<(), utilforth::Error> {
    let config = HttpConfig::builder("https://httpbin.org")
        .default_header("User-Agent", "MyApp/1.0")
        .retry(2)
        .use_session(true)
        .build();
    let mut client = SyncHttpClient::new(config)?;

    let outcome = client.get("/get", RequestOptions::new().query("q", "test"));
    println!("GET: {:?}", outcome.data());

    let outcome = client.post("/post", RequestOptions::new().json(json!({"name": "alice"})));
    println!("POST: {:?}", outcome.data());

    client.close();
    Ok(())
}
