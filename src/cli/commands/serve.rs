//! HTTP API server for the assistant front end.
//!
//! `POST /llm` answers one utterance. Text answers are returned as JSON,
//! streamed answers as a chunked `text/plain` body.

use crate::cli::Output;
use crate::config::{ServerSettings, Settings};
use crate::error::VoxError;
use crate::orchestrator::{AssistantOutput, Orchestrator, SERVER_DOWN};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(&settings)?;
    let state = Arc::new(AppState { orchestrator });
    let app = router(state, cors_layer(&settings.server)?);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("AskVox API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Answer", "POST /llm");
    Output::kv("Reset", "POST /reset");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/llm", post(llm))
        .route("/reset", post(reset))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(settings: &ServerSettings) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if settings.cors_origin == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin: HeaderValue = settings
        .cors_origin
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server.cors_origin '{}': {}", settings.cors_origin, e))?;
    Ok(layer.allow_origin(origin))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct LlmRequest {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct LlmResponse {
    llm_response: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    message: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn llm(State(state): State<Arc<AppState>>, Json(req): Json<LlmRequest>) -> Response {
    match state.orchestrator.handle_user_turn(&req.text).await {
        Ok(AssistantOutput::Text(answer)) => Json(LlmResponse { llm_response: answer }).into_response(),
        Ok(AssistantOutput::Stream(fragments)) => {
            let body = Body::from_stream(fragments.map(Ok::<_, Infallible>));
            ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
        }
        Err(e) => error_response(e),
    }
}

fn error_response(error: VoxError) -> Response {
    match error {
        VoxError::InvalidInput(message) => (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse {
                status: "error",
                message,
            }),
        )
            .into_response(),
        e => {
            warn!("Failed to answer: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: "error",
                    message: SERVER_DOWN.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.orchestrator.clear_context().await;
    Json(StatusResponse {
        status: "ok",
        message: "Conversation cleared".to_string(),
    })
}
