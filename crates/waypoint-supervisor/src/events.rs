use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use waypoint_specialist::ToolInvocation;

use crate::conversation::PlanStep;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
/// One step of run progress, serialized as a JSON object tagged by `type`.
pub enum ProgressEvent {
    Status {
        message: String,
    },
    Plan {
        steps: Vec<PlanStep>,
        agents: Vec<String>,
    },
    PlanUpdate {
        agents: Vec<String>,
        added: String,
        reason: String,
    },
    RoundStart {
        agents: Vec<String>,
        parallel: bool,
    },
    AgentStart {
        agent: String,
        task: String,
    },
    AgentResult {
        agent: String,
        result: String,
        tools_called: Vec<ToolInvocation>,
        is_error: bool,
    },
    SynthesisStart,
    Response {
        text: String,
    },
    Error {
        error: String,
    },
    Done,
}

impl ProgressEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Plan { .. } => "plan",
            Self::PlanUpdate { .. } => "plan_update",
            Self::RoundStart { .. } => "round_start",
            Self::AgentStart { .. } => "agent_start",
            Self::AgentResult { .. } => "agent_result",
            Self::SynthesisStart => "synthesis_start",
            Self::Response { .. } => "response",
            Self::Error { .. } => "error",
            Self::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[derive(Debug, Clone, Default)]
/// Write end of a run's event stream.
///
/// A consumer that stops reading is not an error; events sent after the
/// receiver is dropped are discarded.
pub struct ProgressSink {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    /// A sink that drops every event.
    pub fn discard() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
