//! Chat gateway bootstrap and router wiring.

use super::*;

/// Binds `config.bind` and serves until Ctrl-C.
pub async fn run_chat_server(supervisor: Arc<Supervisor>, config: ChatServerConfig) -> Result<()> {
    let bind_addr = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{}'", config.bind))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind chat server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound chat server address")?;

    info!(
        addr = %local_addr,
        specialists = supervisor.directory().len(),
        model = supervisor.config().model.as_str(),
        "chat server listening"
    );

    let app = build_chat_router(Arc::new(ChatServerState::new(supervisor, config)));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("chat server exited unexpectedly")?;

    info!("chat server stopped");
    Ok(())
}

pub fn build_chat_router(state: Arc<ChatServerState>) -> Router {
    Router::new()
        .route(CHAT_ENDPOINT, post(handle_chat))
        .route(HEALTH_ENDPOINT, get(handle_health))
        .route(INDEX_ENDPOINT, get(handle_index))
        .with_state(state)
}
