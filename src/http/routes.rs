//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::debug;
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{validate_command, CommandError, GameState, PlayerId};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::protocol::{ClientMsg, DuelSnapshot};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/commands", post(command_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    tick: u64,
    state: GameState,
    winner: Option<PlayerId>,
    subscribers: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.duel.snapshot();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        tick: snapshot.tick,
        state: snapshot.state,
        winner: snapshot.winner,
        subscribers: state.duel.events_tx.receiver_count(),
    })
}

// ============================================================================
// Duel endpoints
// ============================================================================

async fn snapshot_handler(State(state): State<AppState>) -> Json<DuelSnapshot> {
    Json(state.duel.snapshot().as_ref().clone())
}

#[derive(Serialize)]
struct CommandResponse {
    status: &'static str,
    request_id: Uuid,
}

/// Queue a command for the next tick. Gating by duel state happens in the
/// loop, so an accepted command may still be ignored there.
async fn command_handler(
    State(state): State<AppState>,
    Json(msg): Json<ClientMsg>,
) -> Result<(StatusCode, Json<CommandResponse>), AppError> {
    if state.command_limiter.check().is_err() {
        return Err(AppError::RateLimited);
    }

    validate_command(&msg)?;

    let request_id = Uuid::new_v4();
    debug!(request_id = %request_id, msg = ?msg, "Command received over HTTP");
    state.duel.send(request_id, msg).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CommandResponse {
            status: "queued",
            request_id,
        }),
    ))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::LoopStopped => AppError::Unavailable(err.to_string()),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
