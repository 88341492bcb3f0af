//! Defines the endpoint for listing a user's transactions.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    Error,
    transaction::{core::get_transactions_by_user, state::TransactionState},
};

/// A route handler for getting all of a user's transactions, most recent first.
///
/// Responds with 404 if the user has no transactions.
pub async fn get_user_transactions_endpoint(
    State(state): State<TransactionState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.connection()?;
    let transactions = get_transactions_by_user(&user_id, &connection)?;

    if transactions.is_empty() {
        return Err(Error::NoTransactionsForUser(user_id));
    }

    Ok(Json(transactions))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::transaction::{
        list_endpoint::get_user_transactions_endpoint, state::TransactionState,
    };

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        // Without the transactions table every query fails.
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(Connection::open_in_memory().unwrap())),
        };

        let response = get_user_transactions_endpoint(State(state), Path("u1".to_owned()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
