//! The state shared by the transaction route handlers.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, Error};

/// The state needed to create, list, delete or summarise transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl TransactionState {
    /// Lock the database connection for the duration of one statement.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if another thread panicked while holding the lock.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire the database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
