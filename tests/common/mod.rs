#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use lostfound::config::Config;
use lostfound::llm::GeminiRequester;
use lostfound::pipeline::MatchPipeline;
use lostfound::server::{router, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the fake model service answers with.
#[derive(Clone)]
pub enum ModelReply {
    /// 200 with this text as the single candidate part.
    Text(String),
    /// Non-2xx status.
    Status(u16),
}

/// In-process stand-in for the Gemini `generateContent` endpoint.
pub struct FakeModel {
    pub addr: SocketAddr,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(HeaderMap, Value)>>>,
}

#[derive(Clone)]
struct FakeState {
    reply: ModelReply,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(HeaderMap, Value)>>>,
}

impl FakeModel {
    pub async fn start(reply: ModelReply) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_request = Arc::new(Mutex::new(None));
        let state = FakeState {
            reply,
            calls: calls.clone(),
            last_request: last_request.clone(),
        };

        let app = Router::new()
            .route("/v1beta/models/{model}", post(generate_content))
            .with_state(state);
        let addr = spawn_app(app).await;

        Self {
            addr,
            calls,
            last_request,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The prompt text of the last request received.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_request.lock().unwrap().as_ref().and_then(|(_, body)| {
            body["contents"][0]["parts"][0]["text"]
                .as_str()
                .map(str::to_string)
        })
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_request
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, body)| body.clone())
    }

    pub fn last_api_key(&self) -> Option<String> {
        self.last_request.lock().unwrap().as_ref().and_then(|(h, _)| {
            h.get("x-goog-api-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
    }
}

async fn generate_content(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some((headers, body));

    match state.reply {
        ModelReply::Text(text) => Json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        }))
        .into_response(),
        ModelReply::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "error": { "message": "simulated failure" } })),
        )
            .into_response(),
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Config pointing the Gemini requester at `base_url` with the key read from `key_env`.
pub fn test_config(base_url: &str, key_env: &str) -> Config {
    let content = format!(
        r#"
[server]
bind = "127.0.0.1:0"

[llm]
provider = "gemini"
model = "gemini-2.5-flash"
api_key_env = "{}"
base_url = "{}"
timeout_secs = 5
"#,
        key_env, base_url
    );
    toml::from_str(&content).unwrap()
}

/// API key the keyed match server sends to the fake model.
pub const TEST_API_KEY: &str = "test-api-key";

/// Start the match server for `config` and return its base URL.
///
/// The credential comes from the process environment, as in production.
pub async fn start_match_server(config: &Config) -> String {
    let pipeline = MatchPipeline::from_config(config).unwrap();
    serve_pipeline(pipeline).await
}

/// Start the match server with [`TEST_API_KEY`] as a fixed credential.
pub async fn start_keyed_match_server(config: &Config) -> String {
    let requester = GeminiRequester::with_api_key(&config.llm, TEST_API_KEY).unwrap();
    let pipeline = MatchPipeline::new(Arc::new(requester), (&config.matching).into());
    serve_pipeline(pipeline).await
}

async fn serve_pipeline(pipeline: MatchPipeline) -> String {
    let addr = spawn_app(router(AppState::new(Arc::new(pipeline)))).await;
    format!("http://{}", addr)
}

pub fn item(id: &str, kind: &str, title: &str) -> Value {
    json!({
        "id": id,
        "type": kind,
        "title": title,
        "category": "Electronics",
        "description": format!("{} description", title),
        "location": "Main Library",
        "date": "2026-10-17",
        "status": "REPORTED",
        "reporterId": "u1"
    })
}

pub fn raw_matches(entries: &[(&str, f64)]) -> String {
    let arr: Vec<Value> = entries
        .iter()
        .map(|(id, c)| json!({ "candidateId": id, "confidence": c, "reasoning": format!("looks like {}", id) }))
        .collect();
    Value::Array(arr).to_string()
}
