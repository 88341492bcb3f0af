//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Error,
    database_id::{DatabaseId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income recorded by a user.
///
/// Rows are never updated, only created and deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, assigned by the database.
    pub id: DatabaseId,
    /// The ID of the user that owns the transaction.
    pub user_id: String,
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount of money earned (positive) or spent (negative).
    pub amount: f64,
    /// The category of the transaction, e.g. "Food", "Rent".
    pub category: String,
    /// When the transaction was stored, assigned by the database.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The validated fields needed to insert a [Transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The ID of the user that owns the transaction.
    pub user_id: String,
    /// A short, non-empty description.
    pub title: String,
    /// Positive values represent income, negative values represent expenses.
    pub amount: f64,
    /// A non-empty category name.
    pub category: String,
}

/// The totals of a user's transactions.
///
/// `income + expense == balance` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// The sum of all amounts.
    pub balance: f64,
    /// The sum of the positive amounts.
    pub income: f64,
    /// The sum of the negative amounts.
    pub expense: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, title, amount, category, created_at";

/// Insert a new transaction and return the stored row.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO transactions (user_id, title, amount, category)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                &new_transaction.user_id,
                &new_transaction.title,
                new_transaction.amount,
                &new_transaction.category,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get all of a user's transactions, most recent first.
///
/// Returns an empty vector if the user has no transactions.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_user(
    user_id: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE user_id = :user_id
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(&[(":user_id", user_id)], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Delete a transaction and return the row that was removed.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a stored transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "DELETE FROM transactions WHERE id = :id RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::DeleteMissingTransaction,
            error => error.into(),
        })
}

/// Sum a user's transactions into a balance, income and expense.
///
/// The two sums are read in a single statement so they describe the same state of the table,
/// and the balance is derived from them. A user with no transactions gets all zeros.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transaction_summary(
    user_id: &str,
    connection: &Connection,
) -> Result<TransactionSummary, Error> {
    let (income, expense): (f64, f64) = connection
        .prepare(
            "SELECT
                COALESCE(SUM(CASE WHEN amount > 0 THEN amount END), 0.0),
                COALESCE(SUM(CASE WHEN amount < 0 THEN amount END), 0.0)
             FROM transactions
             WHERE user_id = :user_id",
        )?
        .query_row(&[(":user_id", user_id)], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;

    Ok(TransactionSummary {
        balance: income + expense,
        income,
        expense,
    })
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM transactions;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// `created_at` is filled in by SQLite as an RFC 3339 UTC timestamp with millisecond precision.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_user_created
         ON transactions(user_id, created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let title = row.get(2)?;
    let amount = row.get(3)?;
    let category = row.get(4)?;
    let created_at: String = row.get(5)?;
    let created_at = OffsetDateTime::parse(&created_at, &Rfc3339).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        id,
        user_id,
        title,
        amount,
        category,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        transaction::core::{
            NewTransaction, TransactionSummary, count_transactions, create_transaction,
            delete_transaction, get_transaction_summary, get_transactions_by_user,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_transaction(user_id: &str, amount: f64) -> NewTransaction {
        NewTransaction {
            user_id: user_id.to_owned(),
            title: "Test".to_owned(),
            amount,
            category: "Misc".to_owned(),
        }
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let transaction = create_transaction(
            &NewTransaction {
                user_id: "u1".to_owned(),
                title: "Coffee".to_owned(),
                amount: -5.0,
                category: "Food".to_owned(),
            },
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.id, 1);
        assert_eq!(transaction.user_id, "u1");
        assert_eq!(transaction.title, "Coffee");
        assert_eq!(transaction.amount, -5.0);
        assert_eq!(transaction.category, "Food");
    }

    #[test]
    fn create_assigns_unique_ids() {
        let conn = get_test_connection();

        let first = create_transaction(&new_transaction("u1", 1.0), &conn).unwrap();
        let second = create_transaction(&new_transaction("u1", 1.0), &conn).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(count_transactions(&conn).unwrap(), 2);
    }

    #[test]
    fn list_returns_only_the_users_transactions_newest_first() {
        let conn = get_test_connection();
        let first = create_transaction(&new_transaction("u1", 1.0), &conn).unwrap();
        create_transaction(&new_transaction("u2", 2.0), &conn).unwrap();
        let third = create_transaction(&new_transaction("u1", 3.0), &conn).unwrap();

        let transactions = get_transactions_by_user("u1", &conn).unwrap();

        assert_eq!(transactions, vec![third, first]);
    }

    #[test]
    fn list_orders_by_created_at() {
        let conn = get_test_connection();
        conn.execute(
            "INSERT INTO transactions (user_id, title, amount, category, created_at)
             VALUES ('u1', 'new', 1.0, 'Misc', '2025-06-01T00:00:00.000Z'),
                    ('u1', 'old', 1.0, 'Misc', '2024-06-01T00:00:00.000Z')",
            (),
        )
        .unwrap();

        let titles: Vec<String> = get_transactions_by_user("u1", &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.title)
            .collect();

        assert_eq!(titles, vec!["new", "old"]);
    }

    #[test]
    fn list_is_empty_for_unknown_user() {
        let conn = get_test_connection();
        create_transaction(&new_transaction("u1", 1.0), &conn).unwrap();

        let transactions = get_transactions_by_user("nobody", &conn).unwrap();

        assert!(transactions.is_empty());
    }

    #[test]
    fn delete_returns_removed_row() {
        let conn = get_test_connection();
        let transaction = create_transaction(&new_transaction("u1", 1.0), &conn).unwrap();

        let deleted = delete_transaction(transaction.id, &conn).unwrap();

        assert_eq!(deleted, transaction);
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn delete_twice_fails() {
        let conn = get_test_connection();
        let transaction = create_transaction(&new_transaction("u1", 1.0), &conn).unwrap();
        delete_transaction(transaction.id, &conn).unwrap();

        let result = delete_transaction(transaction.id, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn summary_is_zero_for_user_without_transactions() {
        let conn = get_test_connection();

        let summary = get_transaction_summary("nobody", &conn).unwrap();

        assert_eq!(summary, TransactionSummary::default());
    }

    #[test]
    fn summary_splits_income_and_expense() {
        let conn = get_test_connection();
        for amount in [100.0, -5.0, 0.0, 20.5, -0.5] {
            create_transaction(&new_transaction("u1", amount), &conn).unwrap();
        }
        create_transaction(&new_transaction("u2", 1000.0), &conn).unwrap();

        let summary = get_transaction_summary("u1", &conn).unwrap();

        assert_eq!(
            summary,
            TransactionSummary {
                balance: 115.0,
                income: 120.5,
                expense: -5.5,
            }
        );
        assert_eq!(summary.income + summary.expense, summary.balance);
    }

    #[test]
    fn queries_fail_without_table() {
        let conn = Connection::open_in_memory().unwrap();

        let result = get_transactions_by_user("u1", &conn);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }
}
