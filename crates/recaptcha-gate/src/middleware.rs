//! Pipeline adapter: runs a [`CaptchaGate`] in front of axum handlers.
//!
//! This is the only module that shapes HTTP responses for gate outcomes.

use std::sync::Arc;

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde::Serialize;

use recaptcha_common::constants::headers;
use recaptcha_common::{CurrentUser, GateDecision, GateError, QueriedUser};

use crate::body::{self, BodyFormat};
use crate::policy::CaptchaGate;
use crate::request::{GateRequest, GateResponse};

/// Request extension inserted for handlers behind a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptchaVerified(pub bool);

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    status: u16,
}

fn error_response(status: StatusCode, message_key: &str) -> Response {
    let body = ErrorBody {
        error: message_key,
        status: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

/// HTTP rendering of a [`GateError`]
#[derive(Debug)]
pub struct GateErrorResponse(pub GateError);

impl From<GateError> for GateErrorResponse {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for GateErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.is_client_error() {
            tracing::debug!(error = %self.0, "Client error");
        } else {
            tracing::error!(error = %self.0, "Gate error");
        }
        error_response(status, self.0.message_key())
    }
}

/// Translate a decision into the host's continue / reject / fail primitives.
///
/// `Continue` calls `next(None)`, `Propagate` calls `next(Some(err))`, and
/// `Reject` records a bad-request state on `response` without calling `next`.
pub fn run_pipeline<F, R>(decision: GateDecision, response: &mut GateResponse, next: F) -> Option<R>
where
    F: FnOnce(Option<GateError>) -> R,
{
    match decision {
        GateDecision::Continue => Some(next(None)),
        GateDecision::Reject(reason) => {
            response.set_bad_request(reason.message_key());
            None
        }
        GateDecision::Propagate(err) => Some(next(Some(err))),
    }
}

/// True when buffering stopped at the configured size limit.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

fn apply_effects(effects: &GateResponse, response: &mut Response) {
    let headers_mut = response.headers_mut();
    for (name, value) in &effects.flags {
        let name = format!("{}{}", headers::FLAG_PREFIX, name);
        if let Ok(name) = HeaderName::try_from(name) {
            headers_mut.insert(name, HeaderValue::from_static(if *value { "true" } else { "false" }));
        }
    }
    if effects.captcha_verified {
        headers_mut.insert(headers::X_CAPTCHA_VERIFIED, HeaderValue::from_static("true"));
    }
}

/// axum middleware enforcing `gate` on the wrapped routes.
///
/// Identities are read from request extensions ([`CurrentUser`],
/// [`QueriedUser`]) placed there by earlier layers.
pub async fn enforce(State(gate): State<Arc<CaptchaGate>>, request: Request, next: Next) -> Response {
    let config = match gate.config() {
        Ok(config) => config,
        Err(e) => return GateErrorResponse(e).into_response(),
    };

    let (mut parts, raw) = request.into_parts();
    let mut gate_request = GateRequest {
        user: parts.extensions.get::<CurrentUser>().cloned(),
        queried_user: parts.extensions.get::<QueriedUser>().cloned(),
        ..Default::default()
    };

    // Bypassed requests are forwarded without touching the body.
    if gate.bypasses(&gate_request) {
        tracing::debug!(policy = %gate.policy(), "Verification bypassed");
        parts.extensions.insert(CaptchaVerified(false));
        return next.run(Request::from_parts(parts, raw)).await;
    }

    let bytes = match to_bytes(raw, config.body_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(e) if is_length_limit(&e) => {
            tracing::debug!(limit = config.body_limit_bytes, "Request body over limit");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let format = BodyFormat::from_headers(&parts.headers);
    let parsed = body::decode(format, &bytes);
    let decoded = parsed.is_some();
    gate_request.body = parsed.unwrap_or_default();

    let mut effects = GateResponse::default();
    let decision = gate.check(&mut gate_request, &mut effects).await;
    let verified = effects.captcha_verified;

    let proceed = run_pipeline(decision, &mut effects, move |err| async move {
        if let Some(err) = err {
            return GateErrorResponse(err).into_response();
        }

        // Only a verified request had its token stripped; re-encode just then.
        let body = if verified && decoded {
            match body::encode(format, &gate_request.body) {
                Ok(encoded) => {
                    parts.headers.remove(header::CONTENT_LENGTH);
                    Body::from(encoded)
                }
                Err(e) => return GateErrorResponse(e).into_response(),
            }
        } else {
            Body::from(bytes)
        };
        parts.extensions.insert(CaptchaVerified(verified));
        next.run(Request::from_parts(parts, body)).await
    });

    let mut response = match proceed {
        Some(fut) => fut.await,
        None => {
            let key = effects.bad_request.as_deref().unwrap_or_default();
            error_response(StatusCode::BAD_REQUEST, key)
        }
    };
    apply_effects(&effects, &mut response);
    response
}
