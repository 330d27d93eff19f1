use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use http::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Stand-in for an OpenAI-compatible completion provider.
///
/// Serves `POST /v1/chat/completions`, counts calls, and records each request body and
/// Authorization header so tests can inspect exactly what the relay sent upstream.
#[derive(Clone)]
pub struct ProviderStub {
    base_url: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[derive(Clone)]
pub enum StubResponse {
    Json {
        status: StatusCode,
        body: serde_json::Value,
    },
    Raw {
        status: StatusCode,
        body: String,
    },
}

#[derive(Clone)]
struct StubState {
    response: StubResponse,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
}

impl ProviderStub {
    pub async fn start(response: StubResponse) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let auth_headers = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(StubState {
            response,
            calls: calls.clone(),
            requests: requests.clone(),
            auth_headers: auth_headers.clone(),
        });

        let router = Router::new()
            .route("/v1/chat/completions", post(completions_handler))
            .layer(DefaultBodyLimit::disable())
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub provider");
        let addr = listener.local_addr().expect("stub provider local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Stub provider server error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        ProviderStub {
            base_url: format!("http://{}/v1", addr),
            calls,
            requests,
            auth_headers,
            shutdown: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Stub answering 200 with a single choice containing `content`.
    pub async fn replying(content: &str) -> Self {
        Self::start(StubResponse::Json {
            status: StatusCode::OK,
            body: completion_body(content),
        })
        .await
    }

    /// Base URL to configure as the relay's provider (`.../v1`).
    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn take_requests(&self) -> Vec<serde_json::Value> {
        let mut guard = self.requests.lock().expect("lock stub requests");
        guard.drain(..).collect()
    }

    pub fn take_auth_headers(&self) -> Vec<Option<String>> {
        let mut guard = self.auth_headers.lock().expect("lock stub auth headers");
        guard.drain(..).collect()
    }
}

impl Drop for ProviderStub {
    fn drop(&mut self) {
        // Clones share the sender; only the last one stops the server.
        if Arc::strong_count(&self.shutdown) > 1 {
            return;
        }
        if let Ok(mut guard) = self.shutdown.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(());
            }
        }
    }
}

async fn completions_handler(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(req): Json<serde_json::Value>,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut guard) = state.requests.lock() {
        guard.push(req);
    }
    let auth = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    if let Ok(mut guard) = state.auth_headers.lock() {
        guard.push(auth);
    }

    match &state.response {
        StubResponse::Json { status, body } => (*status, Json(body.clone())).into_response(),
        StubResponse::Raw { status, body } => (*status, body.clone()).into_response(),
    }
}

/// Minimal Chat Completions response body with one choice.
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-stub",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": "deepseek-chat",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
    })
}
