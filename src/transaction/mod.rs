//! Transaction management for the API.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the database functions for storing, querying and deleting them
//! - Parsing and validation of request bodies
//! - The JSON route handlers

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;
mod payload;
mod state;
mod summary_endpoint;

pub use self::core::{Transaction, TransactionSummary, create_transaction_table};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use list_endpoint::get_user_transactions_endpoint;
pub use summary_endpoint::get_transaction_summary_endpoint;
