//! Defines the endpoint for deleting a transaction.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{core::delete_transaction, state::TransactionState},
};

/// A route handler for deleting a transaction, responds with the deleted row.
///
/// The ID is parsed before the database is touched, so a malformed ID is always a 400.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let transaction_id: TransactionId = raw_id
        .trim()
        .parse()
        .map_err(|_| Error::InvalidTransactionId(raw_id.clone()))?;

    let connection = state.connection()?;
    let transaction = delete_transaction(transaction_id, &connection)?;

    tracing::info!("Deleted transaction {transaction_id}");

    Ok(Json(transaction))
}
