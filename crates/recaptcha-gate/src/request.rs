//! Host-neutral view of the request and response a gate works on.

use std::collections::BTreeMap;

use recaptcha_common::{CurrentUser, QueriedUser};
use serde_json::{Map, Value};

use crate::property;

/// Request data a gate reads: the JSON body plus identities populated by
/// earlier pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct GateRequest {
    pub body: Map<String, Value>,
    pub user: Option<CurrentUser>,
    pub queried_user: Option<QueriedUser>,
}

impl GateRequest {
    pub fn new(body: Map<String, Value>) -> Self {
        Self {
            body,
            ..Default::default()
        }
    }

    /// Build from a JSON value; anything but an object becomes an empty body.
    pub fn from_json(body: Value) -> Self {
        match body {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }

    pub fn with_user(mut self, user: CurrentUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_queried_user(mut self, queried: QueriedUser) -> Self {
        self.queried_user = Some(queried);
        self
    }

    /// Resolve a property path rooted at the request. The first segment
    /// selects `body`, `user`, or `queriedUser`.
    pub fn resolve(&self, path: &str) -> Option<Value> {
        let segments = property::segments(path);
        let (head, rest) = segments.split_first()?;

        let root = match head.as_str() {
            "body" => {
                return match rest.split_first() {
                    None => Some(self.body_value()),
                    Some((key, tail)) => property::resolve_segments(self.body.get(key)?, tail).cloned(),
                };
            }
            "user" => serde_json::to_value(self.user.as_ref()?).ok()?,
            "queriedUser" => serde_json::to_value(self.queried_user.as_ref()?).ok()?,
            _ => return None,
        };
        property::resolve_segments(&root, rest).cloned()
    }

    /// Remove the field at `path` from the body. Paths outside `body` are
    /// left alone.
    pub fn remove_body_field(&mut self, path: &str) -> Option<Value> {
        let segments = property::segments(path);
        match segments.split_first() {
            Some((head, rest)) if head == "body" && !rest.is_empty() => {
                let mut body = Value::Object(std::mem::take(&mut self.body));
                let removed = property::remove_segments(&mut body, rest);
                if let Value::Object(map) = body {
                    self.body = map;
                }
                removed
            }
            _ => None,
        }
    }

    fn body_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

/// Effects a gate asks the host to apply to the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateResponse {
    /// Client-error message key, set when the gate rejects
    pub bad_request: Option<String>,

    /// Named flags for the client
    pub flags: BTreeMap<String, bool>,

    /// The request passed verification
    pub captcha_verified: bool,
}

impl GateResponse {
    pub fn set_bad_request(&mut self, message_key: &str) {
        self.bad_request = Some(message_key.to_string());
    }

    pub fn set_flag(&mut self, name: &str, value: bool) {
        self.flags.insert(name.to_string(), value);
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    pub fn mark_verified(&mut self) {
        self.captcha_verified = true;
    }
}
