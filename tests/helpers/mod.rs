#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Json;
use p256::pkcs8::{EncodePrivateKey, LineEnding};
use p256::SecretKey;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use xdb_agent::client::signer::RequestSigner;
use xdb_agent::client::MemoryServiceClient;
use xdb_agent::config::{KeySource, ServiceConfig};
use xdb_agent::error::LlmError;
use xdb_agent::llm::{ChatMessage, ChatProvider, Completion, ToolCallRequest, ToolSpec};

pub const TEST_API_KEY: &str = "test-api-key";

/// Fixed P-256 key so signatures are reproducible across runs.
pub fn test_secret() -> SecretKey {
    SecretKey::from_slice(&[0x11; 32]).unwrap()
}

pub fn test_pem() -> String {
    test_secret().to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

/// A request as the mock service received it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<Captured>>>,
    responses: Arc<Mutex<VecDeque<(u16, Value)>>>,
    delay: Option<Duration>,
}

/// In-process stand-in for the memory service. Replies with the queued
/// responses in order, then `{"status": "Success"}`.
pub struct MockService {
    pub base_url: String,
    state: MockState,
}

impl MockService {
    pub async fn start(responses: Vec<(u16, Value)>) -> Self {
        Self::start_with_delay(responses, None).await
    }

    pub async fn start_with_delay(responses: Vec<(u16, Value)>, delay: Option<Duration>) -> Self {
        let state = MockState {
            requests: Arc::default(),
            responses: Arc::new(Mutex::new(responses.into())),
            delay,
        };
        let app = axum::Router::new()
            .fallback(handle)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Captured {
        self.requests().pop().expect("no request captured")
    }

    pub fn config(&self) -> ServiceConfig {
        ServiceConfig {
            base_url: self.base_url.clone(),
            api_key: TEST_API_KEY.into(),
            timeout_secs: 2,
            ..ServiceConfig::default()
        }
    }

    pub fn unsigned_client(&self) -> MemoryServiceClient {
        MemoryServiceClient::with_signer(&self.config(), RequestSigner::unsigned()).unwrap()
    }

    pub fn signed_client(&self) -> MemoryServiceClient {
        let signer = RequestSigner::from_source(Some(&KeySource::Pem(test_pem())));
        MemoryServiceClient::with_signer(&self.config(), signer).unwrap()
    }
}

async fn handle(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().unwrap().push(Captured {
        path: uri.path().to_string(),
        headers,
        body: body.to_vec(),
    });
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((200, json!({"status": "Success"})));
    (StatusCode::from_u16(status).unwrap(), Json(body))
}

/// Chat provider that replays canned completions and records what it was sent.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Completion, LlmError>>>,
    pub calls: Mutex<Vec<(Vec<ChatMessage>, Vec<String>)>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<Completion, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::default(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Messages sent on the `n`th completion call.
    pub fn messages(&self, n: usize) -> Vec<ChatMessage> {
        self.calls.lock().unwrap()[n].0.clone()
    }

    /// Tool names offered on the `n`th completion call.
    pub fn offered_tools(&self, n: usize) -> Vec<String> {
        self.calls.lock().unwrap()[n].1.clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<Completion, LlmError> {
        self.calls.lock().unwrap().push((
            messages.to_vec(),
            tools.iter().map(|t| t.name.clone()).collect(),
        ));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Completion::text("done")))
    }
}

/// Provider that asks for another tool call every time.
#[derive(Default)]
pub struct AlwaysCallsTools {
    pub calls: Mutex<usize>,
    /// Number of tools offered on each call.
    pub offered: Mutex<Vec<usize>>,
}

#[async_trait]
impl ChatProvider for AlwaysCallsTools {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<Completion, LlmError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        self.offered.lock().unwrap().push(tools.len());
        Ok(Completion::with_tool_calls(vec![tool_call(
            "list_memories",
            r#"{"user_key":"loop"}"#,
        )]))
    }
}

pub fn tool_call(name: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: format!("call_{name}"),
        name: name.into(),
        arguments: arguments.into(),
    }
}

pub fn memories_response(memories: Value) -> (u16, Value) {
    (
        200,
        json!({"status": "Success", "message": "OK", "data": {"memories": memories}}),
    )
}
