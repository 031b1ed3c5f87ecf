use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, Message, MessageRole,
    ToolChoice, ToolDefinition, WaypointAiError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// How the API key is presented to the endpoint.
pub enum OpenAiAuthScheme {
    #[default]
    Bearer,
    ApiKeyHeader,
}

#[derive(Debug, Clone)]
/// Connection settings for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub organization: Option<String>,
    pub request_timeout_ms: u64,
    pub auth_scheme: OpenAiAuthScheme,
    pub api_version: Option<String>,
}

#[derive(Debug, Clone)]
/// Single-attempt chat-completions client. Failures are returned to the caller
/// unchanged; there is no retry loop here.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, WaypointAiError> {
        if config.api_key.trim().is_empty() {
            return Err(WaypointAiError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match config.auth_scheme {
            OpenAiAuthScheme::Bearer => {
                let bearer = format!("Bearer {}", config.api_key.trim());
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&bearer).map_err(|e| {
                        WaypointAiError::InvalidResponse(format!("invalid API key header: {e}"))
                    })?,
                );
            }
            OpenAiAuthScheme::ApiKeyHeader => {
                headers.insert(
                    "api-key",
                    HeaderValue::from_str(config.api_key.trim()).map_err(|e| {
                        WaypointAiError::InvalidResponse(format!("invalid API key header: {e}"))
                    })?,
                );
            }
        }

        if let Some(org) = &config.organization {
            headers.insert(
                "OpenAI-Organization",
                HeaderValue::from_str(org).map_err(|e| {
                    WaypointAiError::InvalidResponse(format!("invalid organization header: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn chat_completions_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            return base.to_string();
        }

        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, WaypointAiError> {
        let body = build_chat_request_body(&request)?;
        let mut request_builder = self.client.post(self.chat_completions_url());
        if let Some(api_version) = self.config.api_version.as_deref() {
            request_builder = request_builder.query(&[("api-version", api_version)]);
        }

        let response = request_builder.json(&body).send().await?;
        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(WaypointAiError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }

        parse_chat_response(&raw)
    }
}

fn build_chat_request_body(request: &ChatRequest) -> Result<Value, WaypointAiError> {
    let messages = to_openai_messages(&request.messages)?;
    let mut body = json!({
        "model": request.model,
        "messages": messages,
    });

    if !request.tools.is_empty() {
        body["tools"] = to_openai_tools(&request.tools);
    }

    if let Some(tool_choice) = request.tool_choice.as_ref() {
        if !request.tools.is_empty() || matches!(tool_choice, ToolChoice::None) {
            body["tool_choice"] = to_openai_tool_choice(tool_choice);
        }
    }

    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }

    Ok(body)
}

fn to_openai_tool_choice(tool_choice: &ToolChoice) -> Value {
    match tool_choice {
        ToolChoice::Auto => json!("auto"),
        ToolChoice::None => json!("none"),
        ToolChoice::Required => json!("required"),
        ToolChoice::Tool { name } => json!({
            "type": "function",
            "function": {
                "name": name,
            }
        }),
    }
}

fn to_openai_tools(tools: &[ToolDefinition]) -> Value {
    Value::Array(
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect(),
    )
}

fn to_openai_messages(messages: &[Message]) -> Result<Vec<Value>, WaypointAiError> {
    let mut serialized = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::System => serialized.push(json!({
                "role": "system",
                "content": message.text_content(),
            })),
            MessageRole::User => serialized.push(json!({
                "role": "user",
                "content": message.text_content(),
            })),
            MessageRole::Assistant => {
                let tool_calls: Vec<Value> = message
                    .tool_calls()
                    .into_iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": stringify_tool_arguments(&call.arguments),
                            }
                        })
                    })
                    .collect();

                let text = message.text_content();
                let content = if text.trim().is_empty() && !tool_calls.is_empty() {
                    Value::Null
                } else {
                    Value::String(text)
                };

                if tool_calls.is_empty() {
                    serialized.push(json!({
                        "role": "assistant",
                        "content": content,
                    }));
                } else {
                    serialized.push(json!({
                        "role": "assistant",
                        "content": content,
                        "tool_calls": tool_calls,
                    }));
                }
            }
            MessageRole::Tool => {
                let Some(tool_call_id) = message.tool_call_id.as_deref() else {
                    return Err(WaypointAiError::InvalidResponse(
                        "tool message is missing tool_call_id".to_string(),
                    ));
                };

                serialized.push(json!({
                    "role": "tool",
                    "tool_call_id": tool_call_id,
                    "content": message.text_content(),
                }));
            }
        }
    }

    Ok(serialized)
}

fn stringify_tool_arguments(arguments: &Value) -> String {
    match arguments {
        Value::String(value) => value.clone(),
        value => value.to_string(),
    }
}

/// Parses a raw chat-completions response body.
pub fn parse_chat_response(raw: &str) -> Result<ChatResponse, WaypointAiError> {
    let parsed: OpenAiChatResponse = serde_json::from_str(raw)?;
    let choice =
        parsed.choices.into_iter().next().ok_or_else(|| {
            WaypointAiError::InvalidResponse("response contained no choices".to_string())
        })?;

    let mut content = parse_openai_content_blocks(&choice.message.content);

    if let Some(tool_calls) = choice.message.tool_calls {
        for tool_call in tool_calls {
            if tool_call.call_type != "function" {
                continue;
            }

            let arguments = parse_tool_call_arguments(tool_call.function.arguments.as_deref());
            content.push(ContentBlock::ToolCall {
                id: tool_call.id,
                name: tool_call.function.name,
                arguments,
            });
        }
    }

    let usage = parsed
        .usage
        .map(|usage| ChatUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        message: Message::assistant_blocks(content),
        finish_reason: choice.finish_reason,
        usage,
    })
}

fn parse_tool_call_arguments(arguments: Option<&str>) -> Value {
    let Some(arguments) = arguments.filter(|raw| !raw.trim().is_empty()) else {
        return json!({});
    };

    match serde_json::from_str::<Value>(arguments) {
        Ok(value) => value,
        Err(_) => Value::String(arguments.to_string()),
    }
}

fn parse_openai_content_blocks(content: &Option<Value>) -> Vec<ContentBlock> {
    match content {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(text)) => {
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![ContentBlock::Text { text: text.clone() }]
            }
        }
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.as_object())
            .filter(|part| part.get("type").and_then(Value::as_str).unwrap_or("text") == "text")
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .filter(|text| !text.trim().is_empty())
            .map(|text| ContentBlock::Text {
                text: text.to_string(),
            })
            .collect(),
        Some(other) => vec![ContentBlock::Text {
            text: other.to_string(),
        }],
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<Value>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "default_tool_call_type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}
