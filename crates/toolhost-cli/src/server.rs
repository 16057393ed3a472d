//! HTTP front end
//!
//! Exposes a started [`OrchestrationSession`] as `POST /query`. Turns are
//! serialized through a mutex on the session, since a session processes one
//! turn at a time.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use toolhost_core::{CancellationToken, OrchestrationSession};

/// Shared state behind every request
pub struct AppState {
    pub session: Mutex<OrchestrationSession>,
}

impl AppState {
    pub fn new(session: OrchestrationSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/query", post(query)).with_state(state)
}

/// Serve until `cancel` fires, then shut the session down
///
/// The session is shut down on every exit, including a failed bind.
pub async fn serve(session: OrchestrationSession, addr: &str, cancel: CancellationToken) -> Result<()> {
    let state = Arc::new(AppState::new(session));
    let result = run(Arc::clone(&state), addr, cancel).await;

    state.session.lock().await.shutdown().await;
    result
}

async fn run(state: Arc<AppState>, addr: &str, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %addr, "starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("HTTP server error")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// `POST /query` with `{"query": "..."}`
///
/// The body is parsed by hand so that malformed JSON gets the same 400
/// reply as a missing query.
pub async fn query(State(state): State<Arc<AppState>>, body: Bytes) -> (StatusCode, Json<Value>) {
    let query = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("query").and_then(Value::as_str).map(str::to_owned))
        .filter(|q| !q.trim().is_empty());

    let Some(query) = query else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing query" })));
    };

    let mut session = state.session.lock().await;
    match session.process_turn(&query).await {
        Ok(outcome) => (StatusCode::OK, Json(json!({ "response": outcome.response }))),
        Err(e) => {
            tracing::error!(error = %e, "query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolhost_core::config::{ServerConfig, TransportConfig};
    use toolhost_core::llm::MockProvider;
    use toolhost_core::logging::NoOpLogger;
    use toolhost_core::tools::fake::{FakeServer, FakeTransportFactory};
    use toolhost_core::ProviderRegistry;

    fn session(llm: MockProvider) -> OrchestrationSession {
        let factory = FakeTransportFactory::new().with_server("echo", FakeServer::echo());
        let registry = ProviderRegistry::from_configs(
            vec![ServerConfig::new("echo", TransportConfig::stdio("fake", Vec::<String>::new()))],
            Arc::new(factory),
            Arc::new(NoOpLogger::new()),
        );
        OrchestrationSession::new(registry, Arc::new(llm), Arc::new(NoOpLogger::new()))
    }

    async fn started(llm: MockProvider) -> Arc<AppState> {
        let mut session = session(llm);
        session.start().await.unwrap();
        Arc::new(AppState::new(session))
    }

    #[tokio::test]
    async fn test_query_returns_response() {
        let llm = MockProvider::fixed(
            r#"{"tool_call": null, "direct_answer": "Four."}"#,
            Arc::new(NoOpLogger::new()),
        );
        let state = started(llm).await;

        let (status, Json(body)) = query(State(Arc::clone(&state)), Bytes::from(r#"{"query": "2+2?"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "response": "Four." }));

        state.session.lock().await.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_query_is_bad_request() {
        let state = started(MockProvider::echo(Arc::new(NoOpLogger::new()))).await;

        for body in ["{}", r#"{"query": "  "}"#, r#"{"query": 3}"#, "not json", ""] {
            let (status, Json(reply)) = query(State(Arc::clone(&state)), Bytes::from(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(reply, json!({ "error": "Missing query" }));
        }

        state.session.lock().await.shutdown().await;
    }

    #[tokio::test]
    async fn test_query_before_start_is_unavailable() {
        let state = Arc::new(AppState::new(session(MockProvider::echo(Arc::new(NoOpLogger::new())))));

        let (status, Json(reply)) = query(State(state), Bytes::from(r#"{"query": "hi"}"#)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(reply["error"].as_str().unwrap().contains("not ready"));
    }

    #[tokio::test]
    async fn test_serve_shuts_down_on_bind_failure() {
        let mut session = session(MockProvider::echo(Arc::new(NoOpLogger::new())));
        session.start().await.unwrap();

        let err = serve(session, "not an address", CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("failed to bind"));
    }
}
