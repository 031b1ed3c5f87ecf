use serde::{Deserialize, Serialize};
use waypoint_ai::{Message, MessageRole};

#[derive(Debug, Clone, Default, PartialEq)]
/// Append-only message history for one run.
///
/// The reasoning endpoint is stateless, so the whole history is resent on
/// every turn.
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn seed(system_prompt: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(request)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Ids of every action request issued so far, in issue order.
    pub fn issued_request_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|message| message.role == MessageRole::Assistant)
            .flat_map(|message| message.tool_calls())
            .map(|call| call.id)
            .collect()
    }

    /// Ids answered by action-result entries, in append order.
    pub fn answered_request_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|message| message.role == MessageRole::Tool)
            .filter_map(|message| message.tool_call_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One declared step of the plan: which specialist, and why.
pub struct PlanStep {
    pub agent: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Planning,
    Actions,
    Synthesizing,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Progress bookkeeping for one run.
pub struct RunState {
    pub turn: usize,
    pub phase: RunPhase,
    pub plan: Vec<PlanStep>,
    /// Specialist keys in dispatch order. Repeated invocations appear twice.
    pub completed: Vec<String>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            turn: 0,
            phase: RunPhase::Planning,
            plan: Vec::new(),
            completed: Vec::new(),
        }
    }
}

impl RunState {
    pub fn planned_keys(&self) -> Vec<String> {
        self.plan.iter().map(|step| step.agent.clone()).collect()
    }

    pub fn is_planned(&self, key: &str) -> bool {
        self.plan.iter().any(|step| step.agent == key)
    }
}
