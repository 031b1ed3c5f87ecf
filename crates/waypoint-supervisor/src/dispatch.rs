use serde_json::Value;
use tracing::{info, warn};
use waypoint_ai::{Message, ToolCall};
use waypoint_specialist::{truncate_chars, SpecialistResult};

use crate::{
    action_registry::{ActionKind, ActionRegistry},
    conversation::{PlanStep, RunState},
    directory::SpecialistDirectory,
    events::{ProgressEvent, ProgressSink},
};

#[derive(Debug, Clone, PartialEq)]
/// Action-result entries for one batch, one per request, in request order.
pub struct DispatchOutcome {
    pub results: Vec<Message>,
    pub specialists_invoked: usize,
}

struct AgentRequest {
    position: usize,
    call: ToolCall,
    key: String,
    task: String,
    context: String,
}

enum PendingResult {
    Ready(SpecialistResult),
    Spawned(tokio::task::JoinHandle<SpecialistResult>),
}

/// Executes one turn's action requests and folds their results back in
/// request order.
pub struct DispatchCoordinator<'a> {
    registry: &'a ActionRegistry,
    directory: &'a SpecialistDirectory,
    sink: &'a ProgressSink,
    task_display_chars: usize,
}

impl<'a> DispatchCoordinator<'a> {
    pub fn new(
        registry: &'a ActionRegistry,
        directory: &'a SpecialistDirectory,
        sink: &'a ProgressSink,
        task_display_chars: usize,
    ) -> Self {
        Self {
            registry,
            directory,
            sink,
            task_display_chars,
        }
    }

    pub async fn dispatch(&self, requests: &[ToolCall], run: &mut RunState) -> DispatchOutcome {
        let mut slots: Vec<Option<Message>> = vec![None; requests.len()];
        let mut agent_requests = Vec::new();

        for (position, call) in requests.iter().enumerate() {
            match self.registry.classify(&call.name) {
                Some(ActionKind::AnnouncePlan) => {
                    slots[position] = Some(self.record_plan(call, run));
                }
                Some(ActionKind::Specialist(action)) => agent_requests.push(AgentRequest {
                    position,
                    call: call.clone(),
                    key: action.key.clone(),
                    task: call.string_argument("task"),
                    context: call.string_argument("context"),
                }),
                None => {
                    warn!(action = call.name.as_str(), "reasoning endpoint requested unknown action");
                    slots[position] = Some(Message::tool_result(
                        call.id.clone(),
                        call.name.clone(),
                        format!("Unknown tool: {}", call.name),
                        true,
                    ));
                }
            }
        }

        let specialists_invoked = agent_requests.len();
        if !agent_requests.is_empty() {
            for (request, result) in self.run_batch(agent_requests, run).await {
                slots[request.position] = Some(Message::tool_result(
                    request.call.id.clone(),
                    request.call.name.clone(),
                    conversation_text(&result),
                    result.is_error,
                ));
            }
        }

        DispatchOutcome {
            results: slots.into_iter().flatten().collect(),
            specialists_invoked,
        }
    }

    fn record_plan(&self, call: &ToolCall, run: &mut RunState) -> Message {
        let steps = parse_plan_steps(call.argument_object().get("steps"));
        let agents = steps
            .iter()
            .map(|step| step.agent.clone())
            .collect::<Vec<_>>();
        info!(agents = ?agents, "plan announced");
        run.plan = steps.clone();
        self.sink.emit(ProgressEvent::Plan {
            steps,
            agents: agents.clone(),
        });
        Message::tool_result(
            call.id.clone(),
            call.name.clone(),
            format!(
                "Plan confirmed. Proceeding with agents: {}. Remember to call independent agents in parallel by issuing multiple tool calls in a single response.",
                agents.join(", ")
            ),
            false,
        )
    }

    async fn run_batch(
        &self,
        requests: Vec<AgentRequest>,
        run: &mut RunState,
    ) -> Vec<(AgentRequest, SpecialistResult)> {
        let keys = requests
            .iter()
            .map(|request| request.key.clone())
            .collect::<Vec<_>>();

        for key in &keys {
            if run.is_planned(key) {
                continue;
            }
            let reason = format!(
                "Supervisor decided to also consult {}",
                self.registry.display_name(key)
            );
            run.plan.push(PlanStep {
                agent: key.clone(),
                reason: reason.clone(),
            });
            self.sink.emit(ProgressEvent::PlanUpdate {
                agents: run.planned_keys(),
                added: key.clone(),
                reason,
            });
        }

        let parallel = requests.len() > 1;
        self.sink.emit(ProgressEvent::RoundStart {
            agents: keys.clone(),
            parallel,
        });
        for request in &requests {
            self.sink.emit(ProgressEvent::AgentStart {
                agent: request.key.clone(),
                task: truncate_chars(&request.task, self.task_display_chars),
            });
        }

        if parallel {
            info!(agents = ?keys, "running {} specialists in parallel", requests.len());
        }
        let pending = requests
            .iter()
            .map(|request| match self.directory.get(&request.key) {
                Some(specialist) => {
                    let task = request.task.clone();
                    let context = request.context.clone();
                    PendingResult::Spawned(tokio::spawn(async move {
                        specialist.invoke(&task, &context).await
                    }))
                }
                None => PendingResult::Ready(unavailable(&request.key)),
            })
            .collect::<Vec<_>>();

        let mut results = Vec::with_capacity(pending.len());
        for (request, pending) in requests.iter().zip(pending) {
            let result = match pending {
                PendingResult::Ready(result) => result,
                PendingResult::Spawned(handle) => match handle.await {
                    Ok(result) => result,
                    Err(error) => {
                        warn!(specialist = request.key.as_str(), "specialist task failed: {error}");
                        SpecialistResult::error(
                            request.key.clone(),
                            format!("specialist '{}' task failed: {error}", request.key),
                        )
                    }
                },
            };
            results.push(result);
        }

        let mut paired = Vec::with_capacity(requests.len());
        for (request, result) in requests.into_iter().zip(results) {
            let tools_called = if result.is_error {
                Vec::new()
            } else {
                result.tools_called.clone()
            };
            self.sink.emit(ProgressEvent::AgentResult {
                agent: request.key.clone(),
                result: result.result.clone(),
                tools_called,
                is_error: result.is_error,
            });
            run.completed.push(request.key.clone());
            paired.push((request, result));
        }
        paired
    }
}

fn unavailable(key: &str) -> SpecialistResult {
    SpecialistResult::error(key, format!("Agent '{key}' not available"))
}

/// Text folded into the conversation for one specialist result.
fn conversation_text(result: &SpecialistResult) -> String {
    if result.is_error {
        format!("ERROR: {}", result.result)
    } else {
        result.result.clone()
    }
}

/// Reads plan steps leniently: entries without a string `agent` are skipped and
/// a missing `reason` becomes empty.
fn parse_plan_steps(raw: Option<&Value>) -> Vec<PlanStep> {
    let Some(Value::Array(entries)) = raw else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let agent = entry.get("agent")?.as_str()?.to_string();
            let reason = entry
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(PlanStep { agent, reason })
        })
        .collect()
}
