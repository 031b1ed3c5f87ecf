use super::*;

#[derive(Debug, Clone, Deserialize)]
/// Body of `POST /api/chat`.
pub struct ChatRequestBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ChatApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ChatApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// One SSE frame per progress event; `data` is the event's JSON object.
pub(super) fn progress_frame(event: &ProgressEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(payload) => Event::default().data(payload),
        Err(error) => Event::default().data(
            json!({ "type": "error", "error": format!("failed to encode event: {error}") })
                .to_string(),
        ),
    }
}
