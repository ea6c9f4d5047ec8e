//! Per-client rate limiting with a fixed look-back window.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Client key used when the peer address is unavailable.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Admits at most `max_requests` per client within the trailing `window`.
///
/// Each client owns a queue of admission timestamps. A check prunes
/// timestamps older than `now - window`, rejects if the queue is full, and
/// otherwise records `now`. The whole sequence runs under the map's entry
/// lock, so concurrent checks for one client never lose updates.
#[derive(Clone)]
pub struct SlidingWindowLimiter {
    inner: Arc<LimiterInner>,
}

struct LimiterInner {
    enabled: bool,
    window: Duration,
    max_requests: usize,
    ledger: DashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self::build(true, window, max_requests)
    }

    /// A limiter that admits every request.
    pub fn disabled() -> Self {
        Self::build(false, Duration::ZERO, 0)
    }

    pub fn with_config(config: &RateLimitConfig) -> Self {
        Self::build(
            config.enabled,
            Duration::from_secs(config.window_secs),
            config.max_requests,
        )
    }

    fn build(enabled: bool, window: Duration, max_requests: usize) -> Self {
        Self {
            inner: Arc::new(LimiterInner {
                enabled,
                window,
                max_requests,
                ledger: DashMap::new(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    pub fn window(&self) -> Duration {
        self.inner.window
    }

    pub fn max_requests(&self) -> usize {
        self.inner.max_requests
    }

    /// Returns `true` if a request from `client` is admitted now.
    pub fn admit(&self, client: &str) -> bool {
        self.admit_at(client, Instant::now())
    }

    /// Same as [`admit`](Self::admit) with an explicit clock reading.
    pub fn admit_at(&self, client: &str, now: Instant) -> bool {
        if !self.inner.enabled {
            return true;
        }

        let mut timestamps = self.inner.ledger.entry(client.to_owned()).or_default();
        prune(&mut timestamps, now, self.inner.window);

        if timestamps.len() >= self.inner.max_requests {
            return false;
        }
        timestamps.push_back(now);
        true
    }

    /// Replaces the recorded timestamps of `client`.
    pub fn seed<I>(&self, client: &str, timestamps: I)
    where
        I: IntoIterator<Item = Instant>,
    {
        let mut queue: VecDeque<Instant> = timestamps.into_iter().collect();
        queue.make_contiguous().sort();
        self.inner.ledger.insert(client.to_owned(), queue);
    }

    /// Number of timestamps currently held for `client`, stale ones included.
    pub fn recorded(&self, client: &str) -> usize {
        self.inner.ledger.get(client).map_or(0, |entry| entry.len())
    }

    /// Number of clients with a ledger entry.
    pub fn tracked_clients(&self) -> usize {
        self.inner.ledger.len()
    }

    /// Drops clients whose every timestamp has left the window.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let window = self.inner.window;
        let before = self.inner.ledger.len();
        self.inner.ledger.retain(|_, timestamps| {
            prune(timestamps, now, window);
            !timestamps.is_empty()
        });
        before.saturating_sub(self.inner.ledger.len())
    }

    /// Runs [`sweep`](Self::sweep) every `interval` until shutdown fires.
    pub fn spawn_sweeper(
        &self,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(
                                removed,
                                remaining = limiter.tracked_clients(),
                                "Swept idle rate limit entries"
                            );
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now.saturating_duration_since(*oldest) > window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Middleware rejecting requests from clients over their budget with 429.
pub async fn rate_limit_middleware(
    State(limiter): State<SlidingWindowLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    if limiter.admit(&client) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        metrics::record_rate_limited();
        (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
    }
}
