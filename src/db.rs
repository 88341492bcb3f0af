//! Sets up the application's SQLite database.

use rusqlite::Connection;

use crate::transaction::create_transaction_table;

/// Create the tables for the domain models if they do not exist yet.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    create_transaction_table(connection)?;

    Ok(())
}
