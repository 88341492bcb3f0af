//! Parses and validates the request body used to create a transaction.
//!
//! The body may be JSON or a URL encoded form. Fields are checked for presence explicitly,
//! so an amount of zero is accepted while an absent amount is not.

use std::collections::HashMap;

use axum::http::{HeaderMap, header::CONTENT_TYPE};
use serde_json::{Map, Value};

use crate::{Error, transaction::core::NewTransaction};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The largest magnitude an amount may have, the range of a `DECIMAL(10, 2)` column.
///
/// Keeps the per-user sums well inside the range of an `f64`.
pub const MAX_AMOUNT_MAGNITUDE: f64 = 99_999_999.99;

/// The raw fields of a create request before validation.
#[derive(Debug)]
struct RawFields {
    title: Option<String>,
    amount: Option<RawAmount>,
    category: Option<String>,
    user_id: Option<String>,
}

/// An amount as it appeared in the body.
#[derive(Debug, PartialEq)]
enum RawAmount {
    Number(f64),
    Invalid,
}

/// Parse the body of a create request into a validated [NewTransaction].
///
/// # Errors
/// Returns a:
/// - [Error::MissingBody] if `body` is empty,
/// - [Error::InvalidBody] if `body` is not a JSON object or a form,
/// - [Error::EmptyBody] if the object or form has no fields,
/// - [Error::MissingFields] if any required field is absent or blank,
/// - [Error::InvalidAmount] if the amount is not a finite number,
/// - or [Error::AmountOutOfRange] if the amount is larger in magnitude than [MAX_AMOUNT_MAGNITUDE].
pub fn parse_new_transaction(headers: &HeaderMap, body: &[u8]) -> Result<NewTransaction, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::MissingBody);
    }

    let fields = if is_form(headers) {
        parse_form(body)?
    } else {
        parse_json(body)?
    };

    validate(fields)
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE))
}

fn parse_json(body: &[u8]) -> Result<RawFields, Error> {
    let object: Map<String, Value> = match serde_json::from_slice(body) {
        Ok(Value::Object(object)) => object,
        Ok(Value::Null) => return Err(Error::MissingBody),
        Ok(other) => {
            return Err(Error::InvalidBody(format!(
                "expected a JSON object, got {other}"
            )));
        }
        Err(error) => return Err(Error::InvalidBody(error.to_string())),
    };

    if object.is_empty() {
        return Err(Error::EmptyBody);
    }

    Ok(RawFields {
        title: json_string(object.get("title")),
        amount: object.get("amount").and_then(json_amount),
        category: json_string(object.get("category")),
        user_id: json_string(object.get("user_id")),
    })
}

/// Strings are taken as is, numbers are accepted as their decimal text.
fn json_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// `null` counts as absent, any other non-number is present but invalid.
fn json_amount(value: &Value) -> Option<RawAmount> {
    match value {
        Value::Null => None,
        Value::Number(number) => Some(
            number
                .as_f64()
                .map_or(RawAmount::Invalid, RawAmount::Number),
        ),
        Value::String(text) => parse_amount_text(text),
        _ => Some(RawAmount::Invalid),
    }
}

fn parse_form(body: &[u8]) -> Result<RawFields, Error> {
    let mut form: HashMap<String, String> = serde_urlencoded::from_bytes(body)
        .map_err(|error| Error::InvalidBody(error.to_string()))?;

    if form.is_empty() {
        return Err(Error::EmptyBody);
    }

    Ok(RawFields {
        title: form.remove("title"),
        amount: form
            .remove("amount")
            .and_then(|text| parse_amount_text(&text)),
        category: form.remove("category"),
        user_id: form.remove("user_id"),
    })
}

/// A blank string is treated as an absent amount.
fn parse_amount_text(text: &str) -> Option<RawAmount> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match text.parse::<f64>() {
        Ok(amount) => Some(RawAmount::Number(amount)),
        Err(_) => Some(RawAmount::Invalid),
    }
}

fn validate(fields: RawFields) -> Result<NewTransaction, Error> {
    let title = non_blank(fields.title);
    let category = non_blank(fields.category);
    let user_id = non_blank(fields.user_id);

    let mut missing = Vec::new();
    if title.is_none() {
        missing.push("title");
    }
    if fields.amount.is_none() {
        missing.push("amount");
    }
    if category.is_none() {
        missing.push("category");
    }
    if user_id.is_none() {
        missing.push("user_id");
    }

    match (title, fields.amount, category, user_id) {
        (Some(title), Some(RawAmount::Number(amount)), Some(category), Some(user_id))
            if amount.abs() <= MAX_AMOUNT_MAGNITUDE =>
        {
            Ok(NewTransaction {
                user_id,
                title,
                amount,
                category,
            })
        }
        _ if !missing.is_empty() => Err(Error::MissingFields(missing)),
        (_, Some(RawAmount::Number(amount)), _, _) if amount.is_finite() => {
            Err(Error::AmountOutOfRange)
        }
        _ => Err(Error::InvalidAmount),
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}
