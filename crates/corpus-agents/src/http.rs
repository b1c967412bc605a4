//! HTTP execution endpoint for registered agents.
//!
//! `POST /agents/{slug}` with a JSON body `{"arguments": {...}}` runs the
//! agent after its permission check passes. Responses are always JSON;
//! failures carry an `error` message and, past the parse stage, a stable
//! `code` the caller can branch on.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::agent::AgentRegistry;
use crate::permission::RequestContext;

/// Derives a [`RequestContext`] from request headers.
///
/// The embedding application decides what authenticates a caller; the
/// endpoint only carries the result into permission checks.
pub trait ContextProvider: Send + Sync {
    fn context(&self, headers: &HeaderMap) -> RequestContext;
}

/// Treats every caller as anonymous. The default provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousContext;

impl ContextProvider for AnonymousContext {
    fn context(&self, _headers: &HeaderMap) -> RequestContext {
        RequestContext::anonymous()
    }
}

#[derive(Clone)]
struct AppState {
    registry: Arc<AgentRegistry>,
    context: Arc<dyn ContextProvider>,
}

/// Build the agents router.
pub fn router(registry: Arc<AgentRegistry>, context: Arc<dyn ContextProvider>) -> Router {
    Router::new()
        .route("/agents/{slug}", post(execute_agent))
        .with_state(AppState { registry, context })
}

/// Serve the agents router until the process exits.
pub async fn serve(router: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Agents endpoint listening");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

async fn execute_agent(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Invalid JSON in request body"})),
            );
        }
    };

    let Some(arguments) = payload.get("arguments") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing required field: arguments"})),
        );
    };
    let Some(arguments) = arguments.as_object() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Field 'arguments' must be an object"})),
        );
    };

    let Some(agent) = state.registry.get(&slug) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("Agent not found: {slug}"),
                "code": "agent_not_found",
            })),
        );
    };

    let context = state.context.context(&headers);
    let permission = agent.permission();
    if !permission.allows(&context, &slug) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": permission.denied_message(&context, &slug),
                "code": "permission_denied",
            })),
        );
    }

    // Agents run blocking work (storage queries, HTTP calls to embedding
    // services), so execution moves off the async runtime.
    let arguments: Map<String, Value> = arguments.clone();
    let result =
        tokio::task::spawn_blocking(move || agent.execute(&arguments)).await;

    match result {
        Ok(Ok(data)) => {
            info!(slug = %slug, "Agent completed");
            (
                StatusCode::OK,
                Json(json!({"status": "completed", "data": data})),
            )
        }
        Ok(Err(error)) => {
            warn!(slug = %slug, error = %error, "Agent failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": error.to_string(),
                    "code": "execution_failed",
                })),
            )
        }
        Err(error) => {
            warn!(slug = %slug, error = %error, "Agent task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Agent execution failed",
                    "code": "execution_failed",
                })),
            )
        }
    }
}
