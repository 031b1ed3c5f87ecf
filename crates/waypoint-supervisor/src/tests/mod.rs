use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;
use waypoint_ai::{
    ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, Message, MessageRole, ToolCall,
    ToolChoice, WaypointAiError,
};
use waypoint_specialist::{Specialist, SpecialistResult, ToolInvocation};

use crate::{
    ActionRegistry, ProgressEvent, ProgressSink, RunOutcome, RunReport, SpecialistDirectory,
    Supervisor, SupervisorConfig, SupervisorError,
};


struct ScriptedLlmClient {
    responses: AsyncMutex<VecDeque<Result<ChatResponse, WaypointAiError>>>,
    requests: AsyncMutex<Vec<ChatRequest>>,
}

impl ScriptedLlmClient {
    fn new(responses: Vec<Result<ChatResponse, WaypointAiError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: AsyncMutex::new(responses.into()),
            requests: AsyncMutex::new(Vec::new()),
        })
    }

    fn replies(responses: Vec<ChatResponse>) -> Arc<Self> {
        Self::new(responses.into_iter().map(Ok).collect())
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, WaypointAiError> {
        self.requests.lock().await.push(request);
        let mut responses = self.responses.lock().await;
        responses.pop_front().unwrap_or_else(|| {
            Err(WaypointAiError::InvalidResponse(
                "mock response queue is empty".to_string(),
            ))
        })
    }
}

/// Never stops asking for the budget specialist.
struct RelentlessLlmClient {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmClient for RelentlessLlmClient {
    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, WaypointAiError> {
        let turn = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(actions(vec![call(
            &format!("budget-{turn}"),
            "call_budget_agent",
            json!({"task": "again"}),
        )]))
    }
}

/// Panics on its first call, standing in for a broken endpoint client.
struct PanickingLlmClient;

#[async_trait]
impl LlmClient for PanickingLlmClient {
    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, WaypointAiError> {
        panic!("reasoning client crashed");
    }
}

struct StaticSpecialist {
    key: String,
    display_name: String,
    delay: Duration,
    result: SpecialistResult,
    panics: bool,
    received: Mutex<Vec<(String, String)>>,
}

impl StaticSpecialist {
    fn ok(key: &str, text: &str) -> Arc<Self> {
        Self::build(
            key,
            Duration::ZERO,
            SpecialistResult::success(
                key,
                text,
                vec![ToolInvocation {
                    tool: format!("lookup_{key}"),
                    arguments: json!({}),
                }],
            ),
        )
    }

    fn delayed(key: &str, text: &str, delay: Duration) -> Arc<Self> {
        Self::build(key, delay, SpecialistResult::success(key, text, Vec::new()))
    }

    fn failing(key: &str, text: &str) -> Arc<Self> {
        Self::build(key, Duration::ZERO, SpecialistResult::error(key, text))
    }

    fn panicking(key: &str) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            display_name: format!("{key} specialist"),
            delay: Duration::ZERO,
            result: SpecialistResult::error(key, "unreachable"),
            panics: true,
            received: Mutex::new(Vec::new()),
        })
    }

    fn build(key: &str, delay: Duration, result: SpecialistResult) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            display_name: format!("{key} specialist"),
            delay,
            result,
            panics: false,
            received: Mutex::new(Vec::new()),
        })
    }

    fn received(&self) -> Vec<(String, String)> {
        self.received.lock().expect("received lock").clone()
    }
}

#[async_trait]
impl Specialist for StaticSpecialist {
    fn key(&self) -> &str {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn invoke(&self, task: &str, context: &str) -> SpecialistResult {
        self.received
            .lock()
            .expect("received lock")
            .push((task.to_string(), context.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panics {
            panic!("{} specialist crashed", self.key);
        }
        self.result.clone()
    }
}

fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

fn actions(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse {
        message: Message::assistant_blocks(
            calls.into_iter().map(ContentBlock::tool_call).collect(),
        ),
        finish_reason: Some("tool_calls".to_string()),
        usage: ChatUsage::default(),
    }
}

fn answer(text: &str) -> ChatResponse {
    ChatResponse {
        message: Message::assistant_text(text),
        finish_reason: Some("stop".to_string()),
        usage: ChatUsage::default(),
    }
}

fn plan(agents: &[&str]) -> ToolCall {
    call(
        "plan-1",
        "create_plan",
        json!({
            "steps": agents
                .iter()
                .map(|agent| json!({"agent": agent, "reason": format!("need {agent}")}))
                .collect::<Vec<_>>()
        }),
    )
}

fn supervisor(client: Arc<dyn LlmClient>, specialists: Vec<Arc<StaticSpecialist>>) -> Supervisor {
    supervisor_with_config(client, specialists, SupervisorConfig::default())
}

fn supervisor_with_config(
    client: Arc<dyn LlmClient>,
    specialists: Vec<Arc<StaticSpecialist>>,
    config: SupervisorConfig,
) -> Supervisor {
    let mut directory = SpecialistDirectory::new();
    for specialist in specialists {
        directory.insert(specialist);
    }
    Supervisor::new(client, ActionRegistry::travel(), directory, config)
}

async fn run(supervisor: &Supervisor, message: &str) -> (RunReport, Vec<ProgressEvent>) {
    let (sink, mut receiver) = ProgressSink::channel();
    let report = supervisor.execute(message, &sink).await;
    drop(sink);
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    (report, events)
}

fn kinds(events: &[ProgressEvent]) -> Vec<&'static str> {
    events.iter().map(ProgressEvent::kind).collect()
}

fn assert_terminated(events: &[ProgressEvent], penultimate: &str) {
    let kinds = kinds(events);
    assert_eq!(kinds.last().copied(), Some("done"), "events: {kinds:?}");
    assert_eq!(kinds[kinds.len() - 2], penultimate, "events: {kinds:?}");
    assert_eq!(kinds.iter().filter(|kind| **kind == "done").count(), 1);
}

#[test]
fn unit_supervisor_config_defaults_match_runtime_limits() {
    let config = SupervisorConfig::default();
    assert_eq!(config.model, "databricks-claude-sonnet-4-5");
    assert_eq!(config.max_turns, 15);
    assert_eq!(config.max_tokens, Some(4096));
    assert_eq!(config.task_display_chars, 150);
    assert!(config.system_prompt.is_none());
}

#[test]
fn unit_supervisor_error_messages_are_user_facing() {
    assert_eq!(
        SupervisorError::MaxTurnsExceeded(15).to_string(),
        "Supervisor reached maximum turns without completing."
    );
    let model = SupervisorError::Model(WaypointAiError::HttpStatus {
        status: 401,
        body: "bad token".to_string(),
    });
    assert!(model.to_string().starts_with("Model API error: "));
}
