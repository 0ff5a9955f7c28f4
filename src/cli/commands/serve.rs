//! HTTP API server for the chat front end.
//!
//! Provides endpoints to load a video and ask questions about it.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::{SvarError, NO_INDEX_MESSAGE};
use crate::pipeline::Pipeline;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = Pipeline::new(&settings)?;
    match pipeline.restore().await {
        Ok(true) => info!("Serving previously loaded video"),
        Ok(false) => {}
        Err(e) => warn!("Could not restore persisted index: {}", e),
    }

    let state = Arc::new(AppState { pipeline });
    let app = router(state, cors_layer(&settings.server.cors_origins));

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Svar API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Status", "GET  /status");
    Output::kv("Load video", "POST /load_video");
    Output::kv("Ask", "POST /ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/load_video", post(load_video))
        .route("/load_video/", post(load_video))
        .route("/ask", post(ask))
        .route("/ask/", post(ask))
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins. `*` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct LoadVideoRequest {
    /// YouTube URL or video ID
    url: String,
}

#[derive(Serialize)]
struct LoadVideoResponse {
    status: String,
    chunks: usize,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(Serialize)]
struct StatusResponse {
    state: String,
    chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: &SvarError) -> axum::response::Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!("Request failed: {}", e);
    }
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.pipeline.status() {
        Ok(status) => Json(StatusResponse {
            state: status.state.to_string(),
            chunks: status.chunks,
            video_id: status.metadata.as_ref().and_then(|m| m.source_id.clone()),
            created_at: status.metadata.map(|m| m.created_at.to_rfc3339()),
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn load_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoadVideoRequest>,
) -> impl IntoResponse {
    match state.pipeline.ingest(&req.url).await {
        Ok(chunks) => Json(LoadVideoResponse {
            status: "success".to_string(),
            chunks,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> impl IntoResponse {
    match state.pipeline.ask(&req.question).await {
        Ok(answer) => Json(AskResponse { answer }).into_response(),
        Err(SvarError::NoIndex) => Json(AskResponse {
            answer: NO_INDEX_MESSAGE.to_string(),
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}
