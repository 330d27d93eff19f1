#![allow(dead_code)]

pub mod provider_stub;

use std::net::SocketAddr;
use std::time::Duration;

use chat_relay::config::RelayConfig;
use chat_relay::relay::ChatRelay;
use chat_relay::server::{build_router, CHAT_PATH};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Utility module for relay integration tests.
///
/// Spawns the real router (`/api/chat`, `/status`) bound to an ephemeral local port and
/// returns a `TestServer` with convenience helpers. Configuration is passed explicitly, so
/// tests never touch process environment variables.
///
/// Tests that need an upstream point `RelayConfig::base_url` at a `ProviderStub`. Tests that
/// must not reach one can use `http://127.0.0.1:9/v1` (port 9 is discard and fails fast).
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    /// Create a reqwest client with sensible defaults for tests.
    pub fn make_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()
            .expect("failed building reqwest client")
    }

    /// Full URL of the relay endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url, CHAT_PATH)
    }

    /// Perform a GET relative to the server base URL.
    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    /// Perform a POST with JSON body.
    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
    }

    /// Send an arbitrary method with an optional raw body.
    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&str>,
    ) -> reqwest::Result<reqwest::Response> {
        let mut rb = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(http::header::CONTENT_TYPE, "application/json");
        if let Some(b) = body {
            rb = rb.body(b.to_string());
        }
        rb.send().await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Relay configuration targeting `provider_url` with a test API key.
pub fn test_config(provider_url: &str) -> RelayConfig {
    RelayConfig::default()
        .with_api_key("sk-test-relay")
        .with_base_url(provider_url)
}

/// Spawn the relay router on an ephemeral port.
pub async fn spawn_relay(config: RelayConfig) -> TestServer {
    let relay = ChatRelay::with_client(config, TestServer::make_client());
    let app = build_router(relay);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let base_url = format!("http://{}", addr);
    let server = axum::serve(listener, app.into_make_service());

    let join = tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("Test server error: {e:?}");
        }
    });

    TestServer {
        base_url,
        addr,
        join,
        client: TestServer::make_client(),
    }
}
