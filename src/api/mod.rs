pub mod messages;
pub mod middleware;
pub mod sessions;
pub mod state;

pub use middleware::RateLimiter;
pub use state::AppState;

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::store::StatsSnapshot;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        // Health check
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        // Session lifecycle endpoints
        .route("/api/session/create", post(sessions::create_session))
        .route("/api/session/join", post(sessions::join_session))
        .route("/api/session/end", post(sessions::end_session))
        .route("/api/session/heartbeat", post(sessions::heartbeat))
        .route("/api/session/:session_id/status", get(sessions::session_status))
        // Message endpoints
        .route("/api/messages/send", post(messages::send_message))
        .route("/api/messages/:session_id", get(messages::list_messages))
        // Add rate limiting middleware
        .layer(axum_middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            middleware::rate_limit_middleware(limiter, req, next)
        }))
        // Base64-encoded images need a multi-megabyte ceiling
        .layer(DefaultBodyLimit::max(max_body_bytes))
        // Add request timeout
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.store.stats().await)
}
