//! Pulls the client's verification token out of a request.

use serde_json::Value;

use crate::request::GateRequest;

/// Extract the token found at `location` (a property path such as
/// `body.g-recaptcha-response`).
///
/// `None` means nothing resolved at the path. `Some("")` is an empty token;
/// the verifier treats both as "no token provided".
pub fn extract_token(request: &GateRequest, location: &str) -> Option<String> {
    match request.resolve(location)? {
        Value::String(token) => Some(token),
        // Zero and `false` carry no token.
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(false) => None,
        Value::Bool(true) => Some(true.to_string()),
        other => {
            tracing::debug!(location = %location, kind = %value_kind(&other), "Ignoring non-scalar token");
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        _ => "scalar",
    }
}
