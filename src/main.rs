use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emberlink::{
    api::{create_router, AppState, RateLimiter},
    config::Config,
    error::AppError,
    store::SessionStore,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,emberlink=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting emberlink relay v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded");

    // All session, device and message state is in-memory and dies with
    // the process. Expiry and staleness are checked lazily, only when a
    // session is touched; there is no background sweeper.
    let store = SessionStore::new(config.store_config());
    tracing::info!(
        "✅ Session store ready (free session TTL {}s, offline timeout {}s)",
        config.session_ttl_secs,
        config.offline_timeout_secs
    );

    // Create rate limiter
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        config.rate_limit_window_secs,
    ));
    tracing::info!(
        "✅ Rate limiter configured ({} req/{}s per IP)",
        config.rate_limit_max_requests,
        config.rate_limit_window_secs
    );

    // Create shared application state
    let state = AppState {
        store,
        config: config.clone(),
    };

    // Spawn background task for rate limiter cleanup
    {
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300)); // Every 5 minutes
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                tracing::debug!("🧹 Rate limiter cache cleaned up");
            }
        });
        tracing::info!("✅ Rate limiter cleanup task started");
    }

    // Build router
    let app = create_router(state, rate_limiter);

    // Bind and serve
    let addr = config.server_address();
    tracing::info!("🌐 Relay listening on http://{}", addr);
    tracing::info!("🏥 Health check: http://{}/api/health", addr);
    tracing::info!("");
    tracing::info!("📚 API Endpoints:");
    tracing::info!("  POST /api/session/create          - Create session (6-digit code)");
    tracing::info!("  POST /api/session/join            - Join session by code");
    tracing::info!("  POST /api/session/end             - End session (burn)");
    tracing::info!("  POST /api/session/heartbeat       - Liveness ping");
    tracing::info!("  GET  /api/session/:id/status      - Session status probe");
    tracing::info!("  POST /api/messages/send           - Post encrypted envelope");
    tracing::info!("  GET  /api/messages/:session_id    - List session envelopes");
    tracing::info!("");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    // Connect info feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
