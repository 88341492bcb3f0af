//! A small REST API for recording financial transactions.
//!
//! Transactions can be created, listed per user, deleted and summarised into
//! a balance with its income and expense components. Everything is served as
//! JSON and stored in a single SQLite table.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod config;
mod cors;
mod database_id;
mod db;
mod endpoints;
mod health;
mod keep_alive;
mod logging;
mod rate_limit;
mod routing;
mod transaction;

pub use app_state::AppState;
pub use config::{Config, Environment};
pub use cors::build_cors_layer;
pub use db::initialize as initialize_db;
pub use keep_alive::KeepAliveJob;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use rate_limit::RateLimiter;
pub use routing::build_router;
pub use transaction::{Transaction, TransactionSummary};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for ctrl+c: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::debug!("Received ctrl+c signal."),
        _ = terminate => tracing::debug!("Received terminate signal."),
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The create request had no body at all.
    #[error("Request body is missing")]
    MissingBody,

    /// The create request body was an empty object or empty form.
    #[error("Request body is empty")]
    EmptyBody,

    /// The request body could not be parsed as a JSON object or a form.
    #[error("Could not parse request body: {0}")]
    InvalidBody(String),

    /// One or more required fields were absent or blank.
    ///
    /// Holds the names of the offending fields in declaration order.
    #[error("All fields are required")]
    MissingFields(Vec<&'static str>),

    /// The amount was present but was not a finite number.
    #[error("Amount must be a number")]
    InvalidAmount,

    /// The amount was a number too large in magnitude to store.
    #[error("Amount must be between -99999999.99 and 99999999.99")]
    AmountOutOfRange,

    /// The transaction ID in the path is not an integer.
    #[error("Invalid transaction ID")]
    InvalidTransactionId(String),

    /// The user has no transactions.
    #[error("No transactions found for this user")]
    NoTransactionsForUser(String),

    /// Tried to delete a transaction that does not exist.
    #[error("Transaction not found")]
    DeleteMissingTransaction,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The request body could not be read, e.g. the client disconnected mid-body.
    #[error("Could not read request body")]
    UnreadableBody,

    /// The request body is larger than the server accepts.
    #[error("Request body is too large")]
    BodyTooLarge,

    /// The client has exceeded the request rate limit.
    #[error("Too many requests, please try again later.")]
    TooManyRequests {
        /// Seconds until the client may try again.
        retry_after_secs: u64,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing: Vec<&'static str>,
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingBody
            | Error::EmptyBody
            | Error::InvalidBody(_)
            | Error::MissingFields(_)
            | Error::InvalidAmount
            | Error::AmountOutOfRange
            | Error::UnreadableBody
            | Error::InvalidTransactionId(_) => StatusCode::BAD_REQUEST,
            Error::NoTransactionsForUser(_)
            | Error::DeleteMissingTransaction
            | Error::NotFound => StatusCode::NOT_FOUND,
            Error::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::SqlError(_) | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            // The details are for the server logs only.
            tracing::error!("An unexpected error occurred: {}", self);
            let body = ErrorBody {
                error: "Internal server error".to_owned(),
                missing: Vec::new(),
            };
            return (status, Json(body)).into_response();
        }

        tracing::debug!("Rejecting request with {status}: {self}");

        let error = self.to_string();
        let (missing, retry_after_secs) = match self {
            Error::MissingFields(missing) => (missing, None),
            Error::TooManyRequests { retry_after_secs } => (Vec::new(), Some(retry_after_secs)),
            _ => (Vec::new(), None),
        };

        let mut response = (status, Json(ErrorBody { error, missing })).into_response();
        if let Some(retry_after_secs) = retry_after_secs {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

/// The fallback handler for routes that do not exist.
pub async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
