//! Route constants for the chat gateway.

pub(super) const CHAT_ENDPOINT: &str = "/api/chat";
pub(super) const HEALTH_ENDPOINT: &str = "/api/health";
pub(super) const INDEX_ENDPOINT: &str = "/";
pub(super) const INDEX_FILE_NAME: &str = "index.html";
