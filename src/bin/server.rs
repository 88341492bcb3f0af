use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use transactions_api::{
    AppState, Config, KeepAliveJob, RateLimiter, build_cors_layer, build_router, graceful_shutdown,
};

#[tokio::main]
async fn main() {
    setup_logging();

    let config = Config::parse();

    let conn = Connection::open(&config.database_url).unwrap_or_else(|error| {
        tracing::error!("Could not open database {}: {error}", config.database_url);
        std::process::exit(1);
    });
    let state = AppState::new(conn, config.environment()).unwrap_or_else(|error| {
        tracing::error!("Failed to initialize database: {error}");
        std::process::exit(1);
    });

    let rate_limiter = config.environment().is_production().then(|| {
        Arc::new(RateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window(),
        ))
    });

    if config.environment().is_production() {
        match &config.api_url {
            Some(url) => {
                KeepAliveJob::new(url, config.keep_alive_interval()).start();
            }
            None => tracing::warn!("API_URL is not set, the keep-alive job will not run"),
        }
    }

    let router = build_router(state, rate_limiter).layer(build_cors_layer(&config.allowed_origins));
    let router = add_tracing_layer(router);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server is running on {addr}");
    tracing::info!("Environment: {}", config.environment());

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .await
    {
        tracing::error!("Server stopped with an error: {error}");
        std::process::exit(1);
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
