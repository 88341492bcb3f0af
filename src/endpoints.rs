//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{id}', use [format_endpoint].
//!
//! The routes below '/api/transactions/' share the parameter name `id` because the router
//! cannot tell a user ID from a transaction ID by position alone. The handler decides how to
//! interpret it.

/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to list a user's transactions, `id` is the user ID.
pub const USER_TRANSACTIONS: &str = "/api/transactions/{id}";
/// The route to delete a single transaction, `id` is the transaction ID.
pub const TRANSACTION: &str = "/api/transactions/{id}";
/// The route to summarise a user's transactions, `id` is the user ID.
pub const USER_SUMMARY: &str = "/api/transactions/{id}/summary";

/// Replace the parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, value: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}
