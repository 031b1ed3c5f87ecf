use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::{json, Value};
use waypoint_ai::{
    ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, Message, MessageRole, ToolCall,
    WaypointAiError,
};
use waypoint_specialist::SpecialistConfig;
use waypoint_supervisor::{
    ActionRegistry, ProgressEvent, ProgressSink, RunReport, SpecialistDirectory, Supervisor,
    SupervisorConfig,
};

type Script = dyn Fn(usize, &ChatRequest) -> ChatResponse + Send + Sync;

/// Reasoning double that decides each turn from the turn index and the
/// conversation it was sent.
struct ReactiveClient {
    turns: AtomicUsize,
    script: Box<Script>,
}

impl ReactiveClient {
    fn new(script: impl Fn(usize, &ChatRequest) -> ChatResponse + Send + Sync + 'static) -> Self {
        Self {
            turns: AtomicUsize::new(0),
            script: Box::new(script),
        }
    }
}

#[async_trait]
impl LlmClient for ReactiveClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, WaypointAiError> {
        let turn = self.turns.fetch_add(1, Ordering::SeqCst);
        Ok((self.script)(turn, &request))
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
        message: Message::assistant_blocks(calls.into_iter().map(ContentBlock::tool_call).collect()),
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

fn plan(steps: Value) -> ToolCall {
    call("plan", "create_plan", json!({ "steps": steps }))
}

fn last_tool_text(request: &ChatRequest, id: &str) -> String {
    request
        .messages
        .iter()
        .rev()
        .find(|message| {
            message.role == MessageRole::Tool && message.tool_call_id.as_deref() == Some(id)
        })
        .map(Message::text_content)
        .unwrap_or_default()
}

fn specialist_server(key: &str, task_fragment: &str, result: &str) -> MockServer {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/task")
            .body_includes(task_fragment);
        then.status(200).json_body(json!({
            "status": "success",
            "result": result,
            "tools_called": [{"tool": format!("get_{key}"), "arguments": {}}]
        }));
    });
    server
}

fn supervisor(client: ReactiveClient, configs: Vec<SpecialistConfig>) -> Supervisor {
    let directory = SpecialistDirectory::from_configs(configs).expect("directory builds");
    Supervisor::new(
        Arc::new(client),
        ActionRegistry::travel(),
        directory,
        SupervisorConfig::default(),
    )
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

fn round_agents(events: &[ProgressEvent]) -> Vec<(Vec<String>, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::RoundStart { agents, parallel } => Some((agents.clone(), *parallel)),
            _ => None,
        })
        .collect()
}

fn assert_done_after(events: &[ProgressEvent], penultimate: &str) {
    assert_eq!(events.last(), Some(&ProgressEvent::Done));
    assert_eq!(events[events.len() - 2].kind(), penultimate);
}

#[tokio::test]
async fn integration_tokyo_packing_runs_weather_then_packing_with_weather_context() {
    let weather = specialist_server("weather", "Tokyo", "Tokyo next week: rain, 12-18C");
    let packing = MockServer::start();
    let packing_mock = packing.mock(|when, then| {
        when.method(POST).path("/task").json_body_includes(
            json!({"context": "Tokyo next week: rain, 12-18C"}).to_string(),
        );
        then.status(200).json_body(json!({
            "status": "success",
            "result": "Umbrella, light layers, waterproof shoes",
            "tools_called": [{"tool": "get_packing_list", "arguments": {"weather": "rain"}}]
        }));
    });

    let client = ReactiveClient::new(|turn, request| match turn {
        0 => actions(vec![plan(json!([
            {"agent": "weather", "reason": "forecast for Tokyo"},
            {"agent": "packing", "reason": "pack for that weather"}
        ]))]),
        1 => actions(vec![call(
            "w1",
            "call_weather_agent",
            json!({"task": "Weather in Tokyo next week"}),
        )]),
        2 => actions(vec![call(
            "p1",
            "call_packing_agent",
            json!({
                "task": "What to pack for Tokyo next week",
                "context": last_tool_text(request, "w1"),
            }),
        )]),
        _ => answer("## Tokyo packing\n- Umbrella\n- Light layers"),
    });
    let supervisor = supervisor(
        client,
        vec![
            SpecialistConfig::new("weather", weather.base_url()),
            SpecialistConfig::new("packing", packing.base_url()),
        ],
    );

    let (report, events) = run(&supervisor, "What should I pack for Tokyo next week?").await;

    packing_mock.assert();
    match events.iter().find(|event| event.kind() == "plan") {
        Some(ProgressEvent::Plan { agents, .. }) => {
            assert!(agents.contains(&"weather".to_string()));
            assert!(agents.contains(&"packing".to_string()));
        }
        other => panic!("expected plan event, got {other:?}"),
    }
    assert_eq!(
        round_agents(&events),
        vec![
            (vec!["weather".to_string()], false),
            (vec!["packing".to_string()], false)
        ]
    );
    let weather_result = events.iter().position(|event| {
        matches!(event, ProgressEvent::AgentResult { agent, is_error: false, .. } if agent == "weather")
    });
    let packing_round = events.iter().position(|event| {
        matches!(event, ProgressEvent::RoundStart { agents, .. } if agents == &vec!["packing".to_string()])
    });
    assert!(weather_result.expect("weather result") < packing_round.expect("packing round"));
    assert!(events.iter().all(|event| event.kind() != "plan_update"));
    assert_done_after(&events, "response");
    assert_eq!(report.run.completed, vec!["weather", "packing"]);
}

#[tokio::test]
async fn integration_paris_budget_question_only_consults_budget() {
    let budget = specialist_server("budget", "Paris", "About 1800-2500 EUR for a week");
    let weather = MockServer::start();
    let weather_mock = weather.mock(|when, then| {
        when.method(POST).path("/task");
        then.status(200)
            .json_body(json!({"status": "success", "result": "unused"}));
    });

    let client = ReactiveClient::new(|turn, _request| match turn {
        0 => actions(vec![plan(json!([
            {"agent": "budget", "reason": "estimate costs"}
        ]))]),
        1 => actions(vec![call(
            "b1",
            "call_budget_agent",
            json!({"task": "Cost of a week in Paris"}),
        )]),
        _ => answer("A week in Paris costs roughly 1800-2500 EUR."),
    });
    let supervisor = supervisor(
        client,
        vec![
            SpecialistConfig::new("weather", weather.base_url()),
            SpecialistConfig::new("budget", budget.base_url()),
        ],
    );

    let (_report, events) = run(&supervisor, "How much does a week in Paris cost?").await;

    weather_mock.assert_calls(0);
    match events.iter().find(|event| event.kind() == "plan") {
        Some(ProgressEvent::Plan { agents, .. }) => assert_eq!(agents, &vec!["budget".to_string()]),
        other => panic!("expected plan event, got {other:?}"),
    }
    assert_eq!(round_agents(&events), vec![(vec!["budget".to_string()], false)]);
    let results = events
        .iter()
        .filter(|event| event.kind() == "agent_result")
        .collect::<Vec<_>>();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        ProgressEvent::AgentResult { agent, is_error: false, .. } if agent == "budget"
    ));
    assert_done_after(&events, "response");
}

#[tokio::test]
async fn integration_unreachable_budget_is_reported_and_run_still_answers() {
    let transport = specialist_server("transport", "Paris", "Eurostar from London, 2h16");

    let client = ReactiveClient::new(|turn, request| match turn {
        0 => actions(vec![
            call("b1", "call_budget_agent", json!({"task": "Paris costs"})),
            call("t1", "call_transport_agent", json!({"task": "Getting to Paris"})),
        ]),
        _ => {
            let budget = last_tool_text(request, "b1");
            assert!(budget.starts_with("ERROR: Failed to reach Budget Agent"));
            answer("Transport is covered; cost data is unavailable right now.")
        }
    });
    let supervisor = supervisor(
        client,
        vec![
            SpecialistConfig {
                request_timeout_ms: 2_000,
                ..SpecialistConfig::new("budget", "http://127.0.0.1:9")
            },
            SpecialistConfig::new("transport", transport.base_url()),
        ],
    );

    let (_report, events) = run(&supervisor, "Plan a trip to Paris").await;

    assert_eq!(
        round_agents(&events),
        vec![(vec!["budget".to_string(), "transport".to_string()], true)]
    );
    match events
        .iter()
        .find(|event| matches!(event, ProgressEvent::AgentResult { agent, .. } if agent == "budget"))
    {
        Some(ProgressEvent::AgentResult {
            result,
            is_error,
            tools_called,
            ..
        }) => {
            assert!(*is_error);
            assert!(result.starts_with("Failed to reach Budget Agent"), "{result}");
            assert!(tools_called.is_empty());
        }
        other => panic!("expected budget result, got {other:?}"),
    }
    assert!(events.iter().all(|event| event.kind() != "error"));
    assert_done_after(&events, "response");
}

#[tokio::test]
async fn integration_endless_actions_hit_the_turn_bound() {
    let budget = specialist_server("budget", "again", "still expensive");
    let client = ReactiveClient::new(|turn, _request| {
        actions(vec![call(
            &format!("b{turn}"),
            "call_budget_agent",
            json!({"task": "again"}),
        )])
    });
    let supervisor = supervisor(
        client,
        vec![SpecialistConfig::new("budget", budget.base_url())],
    );

    let (report, events) = run(&supervisor, "Paris?").await;

    assert_eq!(report.run.turn, 15);
    assert_eq!(round_agents(&events).len(), 15);
    assert_done_after(&events, "error");
    assert_eq!(
        events[events.len() - 2],
        ProgressEvent::Error {
            error: "Supervisor reached maximum turns without completing.".to_string()
        }
    );
}

#[tokio::test]
async fn integration_timed_out_specialist_does_not_cancel_its_sibling() {
    let slow_budget = MockServer::start();
    slow_budget.mock(|when, then| {
        when.method(POST).path("/task");
        then.status(200)
            .delay(Duration::from_millis(1_500))
            .json_body(json!({"status": "success", "result": "too late"}));
    });
    let transport = specialist_server("transport", "Lyon", "TGV from Paris, 2h");

    let client = ReactiveClient::new(|turn, request| match turn {
        0 => actions(vec![
            call("b1", "call_budget_agent", json!({"task": "Lyon costs"})),
            call("t1", "call_transport_agent", json!({"task": "Getting to Lyon"})),
        ]),
        _ => {
            assert!(last_tool_text(request, "b1").starts_with("ERROR: Failed to reach Budget Agent"));
            assert_eq!(last_tool_text(request, "t1"), "TGV from Paris, 2h");
            answer("Take the TGV; cost data timed out.")
        }
    });
    let supervisor = supervisor(
        client,
        vec![
            SpecialistConfig {
                request_timeout_ms: 200,
                ..SpecialistConfig::new("budget", slow_budget.base_url())
            },
            SpecialistConfig::new("transport", transport.base_url()),
        ],
    );

    let (report, events) = run(&supervisor, "Weekend in Lyon").await;

    assert_eq!(
        round_agents(&events),
        vec![(vec!["budget".to_string(), "transport".to_string()], true)]
    );
    let results = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::AgentResult {
                agent,
                result,
                is_error,
                ..
            } => Some((agent.as_str(), result.as_str(), *is_error)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "budget");
    assert!(results[0].2);
    assert_eq!(
        results[0].1,
        "Failed to reach Budget Agent: timed out after 200ms"
    );
    assert_eq!(results[1], ("transport", "TGV from Paris, 2h", false));
    assert!(report.outcome.is_answered());
    assert_done_after(&events, "response");
}
