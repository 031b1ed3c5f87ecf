//! Reasoning-endpoint wire types and clients for the Waypoint supervisor.
mod openai;
mod types;

pub use openai::{parse_chat_response, OpenAiAuthScheme, OpenAiClient, OpenAiConfig};
pub use types::{
    ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, Message, MessageRole,
    ToolCall, ToolChoice, ToolDefinition, WaypointAiError,
};
