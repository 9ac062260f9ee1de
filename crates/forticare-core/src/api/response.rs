//! Classification of FortiCare response envelopes.
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! {
//!     "status": -1,
//!     "message": "Invalid incoming request.",
//!     "error": { "errorCode": 201, "message": "Invalid security token." },
//!     "token": "...",
//!     "version": "3.0",
//!     "assetDetails": null
//! }
//! ```
//!
//! Only a fixed set of messages means the bearer token is no longer usable.
//! Any other 400/401/403 (bad payload, unknown serial, ...) is a plain error.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, Result};

/// Server messages that mean "your token is invalid, expired or missing".
pub const TOKEN_ERROR_MESSAGES: [&str; 3] = [
    "Invalid security token.",
    "Access denied. No permission to access the requested action or resource.",
    "Please provide token in request.",
];

/// Result of one physical request, before the executor decides what to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Success(Value),
    SessionExpired { status: u16, message: String },
    Failed { status: u16, message: String },
}

/// `error.message` of the envelope, when present.
fn error_message(body: &Value) -> Option<&str> {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
}

/// Top-level `message` of the envelope, when present.
fn top_message(body: &Value) -> Option<&str> {
    body.get("message").and_then(Value::as_str)
}

fn is_token_error(message: &str) -> bool {
    TOKEN_ERROR_MESSAGES.iter().any(|known| *known == message)
}

/// Classify a response from its status and raw body text.
///
/// A 2xx whose body is not JSON is an error; a non-2xx whose body is not JSON
/// still classifies as `Failed`, carrying the raw text.
pub fn classify(status: StatusCode, text: &str) -> Result<RequestOutcome> {
    let parsed: Option<Value> = serde_json::from_str(text).ok();

    if status.is_success() {
        return match parsed {
            Some(body) => Ok(RequestOutcome::Success(body)),
            None => Err(ApiError::InvalidResponse(format!(
                "Expected JSON body, got: {}",
                ApiError::truncate_body(text)
            ))),
        };
    }

    let code = status.as_u16();

    if let Some(ref body) = parsed {
        if matches!(code, 400 | 401 | 403) {
            let expired = error_message(body)
                .filter(|m| is_token_error(m))
                .or_else(|| top_message(body).filter(|m| is_token_error(m)));
            if let Some(message) = expired {
                return Ok(RequestOutcome::SessionExpired {
                    status: code,
                    message: message.to_string(),
                });
            }
        }
    }

    Ok(RequestOutcome::Failed {
        status: code,
        message: failure_message(status, parsed.as_ref(), text),
    })
}

/// Best-effort human readable message for a failed request.
fn failure_message(status: StatusCode, body: Option<&Value>, text: &str) -> String {
    if let Some(body) = body {
        if let Some(message) = error_message(body).or_else(|| top_message(body)) {
            return message.to_string();
        }
    }
    if !text.trim().is_empty() {
        return ApiError::truncate_body(text.trim());
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}

/// Pull the payload stored under `key` out of a success body.
///
/// A missing or `null` key is reported instead of being defaulted.
pub(crate) fn take_payload<T: DeserializeOwned>(
    endpoint: &str,
    mut body: Value,
    key: &str,
) -> Result<T> {
    match body.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Err(ApiError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            key: key.to_string(),
        }),
        Some(payload) => serde_json::from_value(payload).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to decode `{}` from {}: {}", key, endpoint, e))
        }),
    }
}
