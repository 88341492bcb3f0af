//! Defines the endpoint for creating a new transaction.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    Error,
    transaction::{
        core::create_transaction, payload::parse_new_transaction, state::TransactionState,
    },
};

/// A route handler for creating a new transaction, responds with the stored row.
///
/// The body may be JSON or a URL encoded form with the fields `title`, `amount`, `category`
/// and `user_id`. Validation happens before the database is touched.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let new_transaction = parse_new_transaction(&headers, &body).inspect_err(|error| {
        tracing::warn!("Rejected invalid transaction: {error}");
    })?;

    let connection = state.connection()?;
    let transaction = create_transaction(&new_transaction, &connection)?;

    tracing::info!(
        "Created transaction {} for user {}",
        transaction.id,
        transaction.user_id
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}
