use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::AppError;

/// Fixed-window request counter for one client IP.
#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    hits: u32,
    opened: Instant,
}

/// In-memory per-IP rate limiter.
///
/// The default budget is sized for heartbeat polling: two devices pinging
/// every couple of seconds must fit comfortably under it.
#[derive(Clone)]
pub struct RateLimiter {
    clients: Arc<Mutex<HashMap<IpAddr, ClientWindow>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Count one request against `ip`. False means the window budget is
    /// spent and the request should be rejected.
    pub async fn check(&self, ip: IpAddr) -> bool {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();

        let window = clients
            .entry(ip)
            .or_insert(ClientWindow { hits: 0, opened: now });

        if now.duration_since(window.opened) > self.window {
            window.hits = 0;
            window.opened = now;
        }

        if window.hits >= self.max_requests {
            return false;
        }
        window.hits += 1;
        true
    }

    /// Drop windows that have been idle long enough to be irrelevant.
    /// Called periodically so one-off clients don't accumulate forever.
    pub async fn cleanup(&self) {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();
        clients.retain(|_, w| now.duration_since(w.opened) <= self.window * 2);
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // ConnectInfo is populated by into_make_service_with_connect_info
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if !limiter.check(ip).await {
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}
