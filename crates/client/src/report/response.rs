//! Report response decoding.
//!
//! Maps HTTP status codes to [`ReportError`] and folds a cursor delivered in
//! the `record_cursor` response header into the JSON body, so the core
//! paginator only ever has to look at the body.

use reqwest::StatusCode;
use serde_json::{Value, json};

use super::ReportError;
use super::request::CURSOR_HEADER;

/// Decode one page response into the JSON body handed to the paginator.
///
/// A 404 or an empty body is an empty page: the report API answers that way
/// when a report has no (more) records.
pub fn decode_page(status: StatusCode, cursor_header: Option<&str>, body: &[u8]) -> Result<Value, ReportError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ReportError::AuthError { status: status.as_u16() });
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ReportError::RateLimited);
    }

    if status == StatusCode::NOT_FOUND {
        tracing::debug!("report returned 404, treating as empty page");
        return Ok(empty_page());
    }

    if status.is_client_error() || status.is_server_error() {
        return Err(ReportError::HttpError { status: status.as_u16() });
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(empty_page());
    }

    let parsed: Value = serde_json::from_slice(body).map_err(|e| ReportError::Parse(e.to_string()))?;
    Ok(fold_cursor(parsed, cursor_header))
}

/// Put a header cursor into the body unless the body already carries one.
/// A bare array body is wrapped as `{"data": [...]}` first.
pub fn fold_cursor(body: Value, cursor_header: Option<&str>) -> Value {
    let Some(cursor) = cursor_header.map(str::trim).filter(|c| !c.is_empty()) else {
        return body;
    };

    let mut body = match body {
        Value::Array(records) => json!({ "data": records }),
        other => other,
    };

    if let Some(object) = body.as_object_mut() {
        object
            .entry(CURSOR_HEADER)
            .or_insert_with(|| Value::String(cursor.to_string()));
    }

    body
}

fn empty_page() -> Value {
    json!({ "data": [] })
}
