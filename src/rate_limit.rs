//! Limits how many requests each client can make in a fixed time window.
//!
//! Clients are identified by their peer IP address. When the address is not known, e.g. when
//! the server is not started with connection info, every request shares one bucket.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// Once the table holds this many clients, expired windows are removed on the next check.
const PRUNE_THRESHOLD: usize = 10_000;

/// The key used for requests without a known peer address.
const SHARED_CLIENT_KEY: &str = "shared";

#[derive(Debug)]
struct WindowEntry {
    count: u64,
    window_start: Instant,
}

/// The outcome of counting a request against the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// The client must wait this long before the window resets.
    Reject(Duration),
}

/// A fixed window request counter keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u64,
    window: Duration,
    clients: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    /// Allow at most `max_requests` per client in every `window`.
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `client` made now.
    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Decision {
        let mut clients = match self.clients.lock() {
            Ok(clients) => clients,
            Err(error) => {
                tracing::error!("Rate limiter table is unavailable, allowing request: {error}");
                return Decision::Allow;
            }
        };

        if clients.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, entry| now.duration_since(entry.window_start) < window);
        }

        let entry = clients.entry(client.to_owned()).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        let elapsed = now.duration_since(entry.window_start);
        if elapsed >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            return Decision::Reject(self.window.saturating_sub(elapsed));
        }

        entry.count += 1;
        Decision::Allow
    }
}

/// Reject requests from clients that have exceeded the rate limit with 429.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip().to_string())
        .unwrap_or_else(|| SHARED_CLIENT_KEY.to_owned());

    match limiter.check(&client) {
        Decision::Allow => next.run(request).await,
        Decision::Reject(retry_after) => {
            tracing::warn!("Rate limit exceeded for client {client}");
            // Round up so clients never retry a moment too early.
            let retry_after_secs =
                retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            Error::TooManyRequests { retry_after_secs }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, Instant},
    };

    use axum::{Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;

    use super::{Decision, RateLimiter, rate_limit_middleware};

    #[test]
    fn allows_up_to_the_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check_at("a", now), Decision::Allow);
        assert_eq!(limiter.check_at("a", now), Decision::Allow);
        assert_eq!(
            limiter.check_at("a", now + Duration::from_secs(10)),
            Decision::Reject(Duration::from_secs(50))
        );
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check_at("a", now), Decision::Allow);
        assert_eq!(limiter.check_at("b", now), Decision::Allow);
        assert!(matches!(limiter.check_at("a", now), Decision::Reject(_)));
    }

    #[test]
    fn window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check_at("a", now), Decision::Allow);
        assert!(matches!(limiter.check_at("a", now), Decision::Reject(_)));
        assert_eq!(
            limiter.check_at("a", now + Duration::from_secs(60)),
            Decision::Allow
        );
    }

    #[tokio::test]
    async fn middleware_responds_with_too_many_requests() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(60)));
        let app = Router::new()
            .route("/", get(|| async { "hello" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        server.get("/").await.assert_status_ok();
        let response = server.get("/").await;

        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get("retry-after").is_some());
    }
}
