//! Request body codecs for the formats a gate can read tokens from.
//!
//! JSON objects and `application/x-www-form-urlencoded` forms both decode to
//! a string-keyed map and encode back to their original format.

use axum::body::Bytes;
use axum::http::{HeaderMap, header};
use serde_json::{Map, Value};

use recaptcha_common::GateError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    /// Format declared by `Content-Type`. Anything but a form is read as JSON.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let is_form = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE));
        if is_form { Self::Form } else { Self::Json }
    }
}

/// Decode a body into a map. Empty bodies are an empty map; a JSON body that
/// is not an object yields `None`.
pub fn decode(format: BodyFormat, bytes: &Bytes) -> Option<Map<String, Value>> {
    if bytes.is_empty() {
        return Some(Map::new());
    }
    match format {
        BodyFormat::Json => match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        BodyFormat::Form => {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes).ok()?;
            Some(
                pairs
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect(),
            )
        }
    }
}

/// Encode a map back into `format`.
pub fn encode(format: BodyFormat, map: &Map<String, Value>) -> Result<Vec<u8>, GateError> {
    match format {
        BodyFormat::Json => serde_json::to_vec(map).map_err(|e| GateError::Internal(e.to_string())),
        BodyFormat::Form => {
            let pairs: Vec<(&str, String)> = map
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => (key.as_str(), s.clone()),
                    other => (key.as_str(), other.to_string()),
                })
                .collect();
            serde_urlencoded::to_string(pairs)
                .map(String::into_bytes)
                .map_err(|e| GateError::Internal(e.to_string()))
        }
    }
}
