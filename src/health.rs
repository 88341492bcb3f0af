//! The health check endpoint.

use axum::{Json, extract::State};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{AppState, Environment};

/// The body of a health check response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    status: &'static str,
    message: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    env: Environment,
}

/// A route handler that reports the server is up and which environment it runs in.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK",
        message: "Server is running smoothly!",
        timestamp: OffsetDateTime::now_utc(),
        env: state.environment,
    })
}
