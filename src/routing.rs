//! Application router configuration.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};

use crate::{
    AppState, RateLimiter, endpoints, get_404_not_found,
    health::get_health,
    logging::logging_middleware,
    rate_limit::rate_limit_middleware,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint,
        get_transaction_summary_endpoint, get_user_transactions_endpoint,
    },
};

/// The largest request body the server will read, in bytes.
pub const REQUEST_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Return a router with all the app's routes.
///
/// When `rate_limiter` is set every route, including the health check, is rate limited.
/// The logging middleware runs before the rate limiter so rejected requests are logged too.
pub fn build_router(state: AppState, rate_limiter: Option<Arc<RateLimiter>>) -> Router {
    let router = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::USER_TRANSACTIONS,
            get(get_user_transactions_endpoint),
        )
        // Same path as USER_TRANSACTIONS, so the method routers are merged.
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(endpoints::USER_SUMMARY, get(get_transaction_summary_endpoint))
        .fallback(get_404_not_found)
        .with_state(state);

    let router = match rate_limiter {
        Some(limiter) => router.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        )),
        None => router,
    };

    router
        .layer(middleware::from_fn(logging_middleware))
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
}
