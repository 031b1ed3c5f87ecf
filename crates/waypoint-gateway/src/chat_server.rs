use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};
use waypoint_supervisor::{ProgressEvent, Supervisor};

mod endpoints;
mod server_bootstrap;
mod stream_handler;
mod types;

use endpoints::{CHAT_ENDPOINT, HEALTH_ENDPOINT, INDEX_ENDPOINT, INDEX_FILE_NAME};
pub use server_bootstrap::{build_chat_router, run_chat_server};
use stream_handler::stream_chat;
pub use types::{ChatApiError, ChatRequestBody};

pub const DEFAULT_APP_NAME: &str = "waypoint-supervisor";

#[derive(Debug, Clone)]
/// Settings for the chat gateway process.
pub struct ChatServerConfig {
    pub bind: String,
    pub static_dir: Option<PathBuf>,
    pub app_name: String,
}

impl Default for ChatServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            static_dir: None,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

/// Shared by every request. Runs never share anything mutable through it.
pub struct ChatServerState {
    supervisor: Arc<Supervisor>,
    config: ChatServerConfig,
}

impl ChatServerState {
    pub fn new(supervisor: Arc<Supervisor>, config: ChatServerConfig) -> Self {
        Self { supervisor, config }
    }
}

async fn handle_chat(
    State(state): State<Arc<ChatServerState>>,
    Json(body): Json<ChatRequestBody>,
) -> Response {
    let message = body.message.trim();
    if message.is_empty() {
        return ChatApiError::bad_request("message must not be empty").into_response();
    }
    info!(chars = message.chars().count(), "chat request accepted");
    stream_chat(Arc::clone(&state.supervisor), message.to_string())
}

async fn handle_health(State(state): State<Arc<ChatServerState>>) -> Response {
    Json(json!({
        "status": "healthy",
        "app": state.config.app_name,
    }))
    .into_response()
}

async fn handle_index(State(state): State<Arc<ChatServerState>>) -> Response {
    let Some(static_dir) = state.config.static_dir.as_ref() else {
        return ChatApiError::not_found("no static directory configured").into_response();
    };
    let path = static_dir.join(INDEX_FILE_NAME);
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(error) => {
            warn!(path = %path.display(), "index page unavailable: {error}");
            ChatApiError::not_found("index page not found").into_response()
        }
    }
}
