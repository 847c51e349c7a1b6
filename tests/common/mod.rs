#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use http::StatusCode;
use insight_relay::{build_router, AppConfig, AppState};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const TEST_SECRET: &str = "test-dashboard-secret";
pub const TEST_API_KEY: &str = "sk-test-upstream";

/// The relay bound to an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    fn make_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()
            .expect("failed building reqwest client")
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    /// POST a JSON body, optionally with the dashboard secret header.
    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
        secret: Option<&str>,
    ) -> reqwest::Result<reqwest::Response> {
        let mut rb = self.client.post(format!("{}{}", self.base_url, path));
        if let Some(s) = secret {
            rb = rb.header("x-dashboard-secret", s);
        }
        rb.json(body).send().await
    }

    pub async fn post_bytes(
        &self,
        path: &str,
        bytes: Vec<u8>,
        secret: Option<&str>,
    ) -> reqwest::Result<reqwest::Response> {
        self.post_with_content_type(path, bytes, "application/json", secret)
            .await
    }

    pub async fn post_with_content_type(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        secret: Option<&str>,
    ) -> reqwest::Result<reqwest::Response> {
        let mut rb = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(http::header::CONTENT_TYPE, content_type);
        if let Some(s) = secret {
            rb = rb.header("x-dashboard-secret", s);
        }
        rb.body(bytes).send().await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Configuration pointing at `provider_url` with the test secret and key.
pub fn test_config(provider_url: &str) -> AppConfig {
    AppConfig {
        dashboard_secret: TEST_SECRET.to_string(),
        openai_api_key: Some(TEST_API_KEY.to_string()),
        openai_base_url: provider_url.to_string(),
        ..AppConfig::default()
    }
}

/// Spawn the relay with an injected configuration. No process environment is read.
pub async fn spawn_app(config: AppConfig) -> TestServer {
    let app = build_router(AppState::new(config));

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

/// A local address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/v1", addr)
}

pub fn sample_payload() -> Value {
    json!({
        "services": [
            {
                "id": "svc-checkout",
                "name": "checkout",
                "lastStatus": "degraded",
                "lastRespTime": 1830,
                "history": [120, 180, 950, 1830]
            },
            {
                "id": "svc-search",
                "name": "search",
                "lastStatus": "up",
                "lastRespTime": 85,
                "history": [80, 90, 85]
            }
        ],
        "context": {"env": "prod", "window": "15m"}
    })
}

/// Chat Completions body whose first choice carries `content`.
pub fn completion_with_content(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[derive(Clone)]
pub enum ProviderResponse {
    Completion(Value),
    Error {
        status: StatusCode,
        body: String,
    },
    /// Arbitrary body with an explicit content type.
    Raw {
        status: StatusCode,
        content_type: &'static str,
        body: String,
    },
    /// Accept the request and never answer.
    Hang,
}

/// A request the stub provider received.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    response: ProviderResponse,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Stand-in for the completion API, serving `POST /v1/chat/completions`.
pub struct ProviderStub {
    base_url: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ProviderStub {
    pub async fn start(response: ProviderResponse) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(StubState {
            response,
            calls: calls.clone(),
            requests: requests.clone(),
        });

        let router = Router::new()
            .route("/v1/chat/completions", post(completions_handler))
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
            shutdown: Some(tx),
        }
    }

    pub async fn with_content(content: &str) -> Self {
        Self::start(ProviderResponse::Completion(completion_with_content(content))).await
    }

    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn take_requests(&self) -> Vec<CapturedRequest> {
        let mut guard = self.requests.lock().expect("lock stub requests");
        guard.drain(..).collect()
    }
}

impl Drop for ProviderStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn completions_handler(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let authorization = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    if let Ok(mut guard) = state.requests.lock() {
        guard.push(CapturedRequest {
            authorization,
            body,
        });
    }

    match &state.response {
        ProviderResponse::Completion(v) => Json(v.clone()).into_response(),
        ProviderResponse::Error { status, body } => (*status, body.clone()).into_response(),
        ProviderResponse::Raw {
            status,
            content_type,
            body,
        } => (
            *status,
            [(http::header::CONTENT_TYPE, *content_type)],
            body.clone(),
        )
            .into_response(),
        ProviderResponse::Hang => std::future::pending::<Response>().await,
    }
}
