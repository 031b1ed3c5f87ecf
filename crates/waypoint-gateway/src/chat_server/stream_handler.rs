//! SSE response for `/api/chat`.

use super::*;

pub(super) fn stream_chat(supervisor: Arc<Supervisor>, message: String) -> Response {
    let stream = supervisor
        .stream(message)
        .map(|event| Ok::<Event, Infallible>(types::progress_frame(&event)));
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
