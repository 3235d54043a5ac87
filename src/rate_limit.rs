use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP. A window opens on the
/// first request from an address and every request inside it counts against
/// the limit; once the window elapses the next request opens a fresh one.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Records one request from `ip`. Returns `AppError::RateLimited` once
    /// the address has exhausted its allowance for the current window.
    pub async fn check(&self, ip: IpAddr) -> Result<()> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // Elapsed windows are swept wholesale, so the map only holds
        // addresses seen within the current window length.
        windows.retain(|_, window| now.duration_since(window.started_at) < self.window);

        let window = windows.entry(ip).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if window.count >= self.max_requests {
            let elapsed = now.duration_since(window.started_at);
            let retry_after_secs = self.window.saturating_sub(elapsed).as_secs().max(1);
            return Err(AppError::RateLimited { retry_after_secs });
        }

        window.count += 1;
        Ok(())
    }
}

/// Middleware applied to the `/api` routes.
pub async fn enforce(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response> {
    if let Err(err) = state.rate_limiter.check(addr.ip()).await {
        tracing::warn!(ip = %addr.ip(), "rate limit exceeded");
        return Err(err);
    }
    Ok(next.run(request).await)
}
