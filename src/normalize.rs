//! Response normalisation.
//!
//! Engines answer with JSON when things go well and with whatever their web
//! server produces when they do not. [`normalize`] never fails: a body that
//! decodes to JSON becomes [`NormalizedResult::Decoded`], anything else
//! (including an empty body or a bare `null`) keeps the status and raw body
//! in [`NormalizedResult::Error`] so callers can branch on content.

use serde_json::{json, Value};

use crate::Response;

/// A decoded reply, or the status and raw body of one that did not decode.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult {
    /// The body parsed as JSON.
    Decoded(Value),
    /// The body was not JSON.
    Error {
        /// The HTTP status code of the reply
        status: u16,
        /// The body exactly as received
        raw_body: String,
    },
}

impl NormalizedResult {
    pub fn is_error(&self) -> bool {
        matches!(self, NormalizedResult::Error { .. })
    }

    pub fn decoded(&self) -> Option<&Value> {
        match self {
            NormalizedResult::Decoded(value) => Some(value),
            NormalizedResult::Error { .. } => None,
        }
    }

    /// Collapses the result into a single JSON value.
    ///
    /// Errors become `{"errors": "Status: <code><br>Body: <body>"}`.
    ///
    /// # Examples
    ///
    /// ```
    /// use qengine_client::NormalizedResult;
    /// use serde_json::json;
    ///
    /// let result = NormalizedResult::Error { status: 404, raw_body: "Not Found".into() };
    /// assert_eq!(result.into_value(), json!({"errors": "Status: 404<br>Body: Not Found"}));
    /// ```
    pub fn into_value(self) -> Value {
        match self {
            NormalizedResult::Decoded(value) => value,
            NormalizedResult::Error { status, raw_body } => {
                json!({ "errors": format!("Status: {}<br>Body: {}", status, raw_body) })
            }
        }
    }
}

/// Decodes a response body as JSON, falling back to a structured error.
pub fn normalize(response: &Response) -> NormalizedResult {
    match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Null) | Err(_) => {
            tracing::warn!(
                status = response.status_code(),
                raw_response = %response.body,
                "Response body is not JSON"
            );
            NormalizedResult::Error {
                status: response.status_code(),
                raw_body: response.body.clone(),
            }
        }
        Ok(value) => NormalizedResult::Decoded(value),
    }
}
