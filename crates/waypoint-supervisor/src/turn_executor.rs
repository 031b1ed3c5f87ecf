use std::{collections::HashSet, sync::Arc};

use tracing::debug;
use waypoint_ai::{
    ChatRequest, ContentBlock, LlmClient, Message, ToolCall, ToolChoice, WaypointAiError,
};

use crate::{action_registry::ActionRegistry, conversation::ConversationState};

#[derive(Debug)]
/// What one reasoning-endpoint call asked for.
pub enum TurnOutcome {
    /// One or more actions issued together. `assistant` carries the requests
    /// with normalized ids and must be appended before their results.
    ActionsRequested {
        assistant: Message,
        requests: Vec<ToolCall>,
    },
    FinalAnswer(String),
    ModelFailure(WaypointAiError),
}

#[derive(Clone)]
/// Makes exactly one reasoning-endpoint call per turn.
pub struct TurnExecutor {
    client: Arc<dyn LlmClient>,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl TurnExecutor {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    pub async fn execute(
        &self,
        turn: usize,
        state: &ConversationState,
        registry: &ActionRegistry,
    ) -> TurnOutcome {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: state.messages().to_vec(),
            tools: registry.tool_definitions(),
            tool_choice: Some(ToolChoice::Auto),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = match self.client.complete(request).await {
            Ok(response) => response,
            Err(error) => return TurnOutcome::ModelFailure(error),
        };

        let mut requests = response.message.tool_calls();
        if requests.is_empty() {
            return TurnOutcome::FinalAnswer(response.message.text_content());
        }

        normalize_request_ids(turn, &state.issued_request_ids(), &mut requests);
        debug!(
            turn,
            requests = requests.len(),
            finish_reason = response.finish_reason.as_deref().unwrap_or("none"),
            "reasoning endpoint requested actions"
        );

        let text = response.message.text_content();
        let mut content = Vec::with_capacity(requests.len() + 1);
        if !text.trim().is_empty() {
            content.push(ContentBlock::Text { text });
        }
        content.extend(requests.iter().cloned().map(ContentBlock::tool_call));

        TurnOutcome::ActionsRequested {
            assistant: Message::assistant_blocks(content),
            requests,
        }
    }
}

/// Replaces blank or already-used ids so every request id is unique within
/// the run.
fn normalize_request_ids(turn: usize, issued: &[String], requests: &mut [ToolCall]) {
    let mut seen = issued.iter().cloned().collect::<HashSet<_>>();
    for (index, request) in requests.iter_mut().enumerate() {
        if request.id.trim().is_empty() || seen.contains(&request.id) {
            let mut candidate = format!("call_{turn}_{index}");
            let mut suffix = 1;
            while seen.contains(&candidate) {
                candidate = format!("call_{turn}_{index}_{suffix}");
                suffix += 1;
            }
            request.id = candidate;
        }
        seen.insert(request.id.clone());
    }
}
