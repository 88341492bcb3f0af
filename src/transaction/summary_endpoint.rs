//! Defines the endpoint for summarising a user's transactions.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    Error,
    transaction::{core::get_transaction_summary, state::TransactionState},
};

/// A route handler for getting a user's balance, income and expense.
///
/// A user without transactions gets zeros rather than a 404.
pub async fn get_transaction_summary_endpoint(
    State(state): State<TransactionState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.connection()?;
    let summary = get_transaction_summary(&user_id, &connection)?;

    Ok(Json(summary))
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
        summary_endpoint::get_transaction_summary_endpoint, state::TransactionState,
    };

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        // Without the transactions table every query fails.
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(Connection::open_in_memory().unwrap())),
        };

        let response = get_transaction_summary_endpoint(State(state), Path("u1".to_owned()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
