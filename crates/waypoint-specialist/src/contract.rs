use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TASK_STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Body of `POST /task`.
pub struct TaskRequest {
    pub task: String,
    #[serde(default)]
    pub context: String,
}

impl TaskRequest {
    pub fn new(task: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            context: context.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// One sub-tool a specialist called while working on a task.
pub struct ToolInvocation {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Envelope returned by `POST /task`.
pub struct TaskResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub tools_called: Vec<ToolInvocation>,
}

impl TaskResponse {
    pub fn is_success(&self) -> bool {
        self.status == TASK_STATUS_SUCCESS
    }
}

/// Parses a `/task` response body.
pub fn parse_task_response(raw: &str) -> Result<TaskResponse, serde_json::Error> {
    serde_json::from_str(raw)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Body of `GET /health`.
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Outcome of one specialist invocation, successful or not.
pub struct SpecialistResult {
    pub key: String,
    pub result: String,
    pub is_error: bool,
    pub tools_called: Vec<ToolInvocation>,
}

impl SpecialistResult {
    pub fn success(
        key: impl Into<String>,
        result: impl Into<String>,
        tools_called: Vec<ToolInvocation>,
    ) -> Self {
        Self {
            key: key.into(),
            result: result.into(),
            is_error: false,
            tools_called,
        }
    }

    pub fn error(key: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            result: result.into(),
            is_error: true,
            tools_called: Vec::new(),
        }
    }

    /// Builds the result from a decoded envelope. The error flag is set exactly
    /// when the reported status is not `success`.
    pub fn from_task_response(key: impl Into<String>, response: TaskResponse) -> Self {
        let is_error = !response.is_success();
        Self {
            key: key.into(),
            result: response.result.unwrap_or_else(|| "No result".to_string()),
            is_error,
            tools_called: response.tools_called,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecialistHealth {
    pub key: String,
    pub healthy: bool,
    pub agent: Option<String>,
    pub detail: Option<String>,
}

/// Returns at most the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}
