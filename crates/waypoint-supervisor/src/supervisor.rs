use std::sync::Arc;

use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};
use waypoint_ai::LlmClient;

use crate::{
    action_registry::ActionRegistry,
    conversation::{ConversationState, RunPhase, RunState},
    directory::SpecialistDirectory,
    dispatch::DispatchCoordinator,
    events::{ProgressEvent, ProgressSink},
    turn_executor::{TurnExecutor, TurnOutcome},
    SupervisorConfig, SupervisorError,
};

const PLANNING_STATUS: &str = "Planning which agents to use...";

#[derive(Debug)]
pub enum RunOutcome {
    Answered(String),
    Failed(SupervisorError),
}

impl RunOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

#[derive(Debug)]
/// Final state of one run, handed back once its event stream is closed.
pub struct RunReport {
    pub outcome: RunOutcome,
    pub run: RunState,
    pub conversation: ConversationState,
}

/// Orchestration loop entry point.
///
/// One `Supervisor` serves any number of runs; each run owns its own
/// conversation and run state.
pub struct Supervisor {
    executor: TurnExecutor,
    registry: ActionRegistry,
    directory: Arc<SpecialistDirectory>,
    config: SupervisorConfig,
    system_prompt: String,
}

impl Supervisor {
    pub fn new(
        client: Arc<dyn LlmClient>,
        registry: ActionRegistry,
        directory: SpecialistDirectory,
        config: SupervisorConfig,
    ) -> Self {
        let system_prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| registry.system_prompt());
        Self {
            executor: TurnExecutor::new(
                client,
                config.model.clone(),
                config.max_tokens,
                config.temperature,
            ),
            registry,
            directory: Arc::new(directory),
            config,
            system_prompt,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &SpecialistDirectory {
        &self.directory
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Runs one request to completion, emitting progress into `sink`.
    ///
    /// The sink always receives `done` last, preceded by `response` or `error`.
    pub async fn execute(&self, message: &str, sink: &ProgressSink) -> RunReport {
        let mut conversation = ConversationState::seed(self.system_prompt.clone(), message);
        let mut run = RunState::default();
        sink.emit(ProgressEvent::Status {
            message: PLANNING_STATUS.to_string(),
        });

        let outcome = self.drive(&mut conversation, &mut run, sink).await;
        match &outcome {
            RunOutcome::Answered(text) => {
                run.phase = RunPhase::Done;
                info!(turn = run.turn, completed = run.completed.len(), "run answered");
                sink.emit(ProgressEvent::Response { text: text.clone() });
            }
            RunOutcome::Failed(error) => {
                run.phase = RunPhase::Failed;
                warn!(turn = run.turn, "run failed: {error}");
                sink.emit(ProgressEvent::Error {
                    error: error.to_string(),
                });
            }
        }
        sink.emit(ProgressEvent::Done);

        RunReport {
            outcome,
            run,
            conversation,
        }
    }

    async fn drive(
        &self,
        conversation: &mut ConversationState,
        run: &mut RunState,
        sink: &ProgressSink,
    ) -> RunOutcome {
        let coordinator = DispatchCoordinator::new(
            &self.registry,
            &self.directory,
            sink,
            self.config.task_display_chars,
        );

        while run.turn < self.config.max_turns {
            run.turn += 1;
            info!(turn = run.turn, "supervisor turn");

            match self.executor.execute(run.turn, conversation, &self.registry).await {
                TurnOutcome::ActionsRequested {
                    assistant,
                    requests,
                } => {
                    run.phase = RunPhase::Actions;
                    conversation.push(assistant);
                    let outcome = coordinator.dispatch(&requests, run).await;
                    debug!(
                        turn = run.turn,
                        actions = requests.len(),
                        specialists = outcome.specialists_invoked,
                        "turn actions resolved"
                    );
                    conversation.extend(outcome.results);
                    run.phase = RunPhase::Planning;
                }
                TurnOutcome::FinalAnswer(text) => {
                    run.phase = RunPhase::Synthesizing;
                    sink.emit(ProgressEvent::SynthesisStart);
                    return RunOutcome::Answered(text);
                }
                TurnOutcome::ModelFailure(error) => {
                    return RunOutcome::Failed(SupervisorError::Model(error));
                }
            }
        }

        RunOutcome::Failed(SupervisorError::MaxTurnsExceeded(self.config.max_turns))
    }

    /// Spawns a run and returns its event stream. Dropping the stream does not
    /// cancel the run.
    ///
    /// If the run task itself panics, the stream still closes with `error`
    /// followed by `done`.
    pub fn stream(
        self: &Arc<Self>,
        message: impl Into<String>,
    ) -> UnboundedReceiverStream<ProgressEvent> {
        let (sink, receiver) = ProgressSink::channel();
        let supervisor = Arc::clone(self);
        let message = message.into();
        let run_sink = sink.clone();
        let run = tokio::spawn(async move {
            supervisor.execute(&message, &run_sink).await;
        });
        tokio::spawn(async move {
            if let Err(error) = run.await {
                warn!("supervisor run task failed: {error}");
                sink.emit(ProgressEvent::Error {
                    error: format!("Supervisor run failed: {error}"),
                });
                sink.emit(ProgressEvent::Done);
            }
        });
        UnboundedReceiverStream::new(receiver)
    }
}
