//! Mock upstream provider APIs for integration tests
//!
//! One axum server speaks the OpenAI chat completions format under `/v1`,
//! the Gemini `generateContent` family under `/gemini` and the Perplexity
//! chat completions format under `/perplexity`. Every request is recorded.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// How the mock answers every request
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Buffered calls get the joined text; streaming calls get one chunk per fragment
    Fragments(Vec<String>),
    /// Stream the fragments, then break the stream with an unusable chunk
    FragmentsThenError(Vec<String>),
    /// Reject every call with this status
    Fail(StatusCode),
    /// Answer with a candidate (or choice list) that carries no text
    Blocked(String),
}

impl Behavior {
    /// Single buffered reply
    pub fn reply(text: &str) -> Self {
        Self::Fragments(vec![text.to_owned()])
    }

    /// Streamed reply, one chunk per fragment
    pub fn fragments(fragments: &[&str]) -> Self {
        Self::Fragments(fragments.iter().map(|f| (*f).to_owned()).collect())
    }
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub query: HashMap<String, String>,
    pub body: Value,
}

/// Mock upstream for all three providers
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    behavior: Behavior,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn record(&self, path: String, headers: &HeaderMap, query: HashMap<String, String>, body: Value) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        self.requests.lock().unwrap().push(RecordedRequest {
            path,
            authorization,
            query,
            body,
        });
    }
}

impl MockUpstream {
    /// Start the mock server, returning immediately
    pub async fn start(behavior: Behavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            behavior,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_openai))
            .route("/perplexity/chat/completions", routing::post(handle_perplexity))
            .route("/gemini/models/{call}", routing::post(handle_gemini))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for the `OpenAI` provider
    pub fn openai_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Base URL for the Gemini provider
    pub fn gemini_url(&self) -> String {
        format!("http://{}/gemini", self.addr)
    }

    /// Base URL for the Perplexity provider
    pub fn perplexity_url(&self) -> String {
        format!("http://{}/perplexity", self.addr)
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// The only request received, panicking if there were none or several
    pub fn single_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one upstream request");
        requests.into_iter().next().unwrap()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Handlers --

async fn handle_openai(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let stream = body["stream"].as_bool().unwrap_or(false);
    state.record("/v1/chat/completions".to_owned(), &headers, HashMap::new(), body);

    chat_completions(&state.behavior, stream)
}

async fn handle_perplexity(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/perplexity/chat/completions".to_owned(), &headers, HashMap::new(), body);

    chat_completions(&state.behavior, false)
}

async fn handle_gemini(
    State(state): State<Arc<MockState>>,
    Path(call): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let stream = call.ends_with(":streamGenerateContent");
    state.record(format!("/gemini/models/{call}"), &headers, query, body);

    match &state.behavior {
        Behavior::Fail(status) => failure(*status),
        Behavior::Blocked(reason) if stream => sse(vec![gemini_blocked(reason).to_string()]),
        Behavior::Blocked(reason) => Json(gemini_blocked(reason)).into_response(),
        Behavior::Fragments(fragments) if stream => {
            sse(fragments.iter().map(|f| gemini_chunk(f).to_string()).collect())
        }
        Behavior::FragmentsThenError(fragments) if stream => {
            let mut events: Vec<String> = fragments.iter().map(|f| gemini_chunk(f).to_string()).collect();
            events.push("{\"candidates\": 5}".to_owned());
            sse(events)
        }
        Behavior::Fragments(fragments) | Behavior::FragmentsThenError(fragments) => {
            Json(gemini_chunk(&fragments.concat())).into_response()
        }
    }
}

fn chat_completions(behavior: &Behavior, stream: bool) -> Response {
    match behavior {
        Behavior::Fail(status) => failure(*status),
        Behavior::Blocked(_) if stream => sse(vec![finish_chunk().to_string(), "[DONE]".to_owned()]),
        Behavior::Blocked(_) => Json(json!({"id": "chatcmpl-test-123", "choices": []})).into_response(),
        Behavior::Fragments(fragments) if stream => {
            let mut events = vec![role_chunk().to_string()];
            events.extend(fragments.iter().map(|f| content_chunk(f).to_string()));
            events.push(finish_chunk().to_string());
            events.push("[DONE]".to_owned());
            sse(events)
        }
        Behavior::FragmentsThenError(fragments) if stream => {
            let mut events = vec![role_chunk().to_string()];
            events.extend(fragments.iter().map(|f| content_chunk(f).to_string()));
            events.push(json!({"error": {"message": "upstream overloaded", "type": "server_error"}}).to_string());
            sse(events)
        }
        Behavior::Fragments(fragments) | Behavior::FragmentsThenError(fragments) => Json(json!({
            "id": "chatcmpl-test-123",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "mock-model",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": fragments.concat()},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .into_response(),
    }
}

// -- Wire helpers --

fn failure(status: StatusCode) -> Response {
    (
        status,
        Json(json!({"error": {"message": "mock upstream intentional failure", "type": "server_error"}})),
    )
        .into_response()
}

fn sse(events: Vec<String>) -> Response {
    let body: String = events.iter().map(|data| format!("data: {data}\n\n")).collect();

    (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn role_chunk() -> Value {
    json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"role": "assistant"}}]
    })
}

fn content_chunk(text: &str) -> Value {
    json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"content": text}}]
    })
}

fn finish_chunk() -> Value {
    json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
    })
}

fn gemini_chunk(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn gemini_blocked(reason: &str) -> Value {
    json!({"candidates": [{"finishReason": reason}]})
}
