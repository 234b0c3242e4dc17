//! Demo handlers sitting behind gates, plus the identity layers they rely on.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

use recaptcha_common::constants::headers;
use recaptcha_common::{CurrentUser, Role};

use crate::body::{self, BodyFormat};
use crate::middleware::CaptchaVerified;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Accepted {
    status: &'static str,
    captcha: bool,
    fields: Map<String, Value>,
}

/// Echo the accepted submission (JSON or form) so callers can see what
/// reached the handler
pub async fn accept(
    Extension(CaptchaVerified(captcha)): Extension<CaptchaVerified>,
    request_headers: HeaderMap,
    payload: Bytes,
) -> Result<Json<Accepted>, StatusCode> {
    let fields = body::decode(BodyFormat::from_headers(&request_headers), &payload)
        .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;

    Ok(Json(Accepted {
        status: "accepted",
        captcha,
        fields,
    }))
}

fn current_user(headers: &HeaderMap) -> Option<CurrentUser> {
    let id = headers.get(headers::X_USER_ID)?.to_str().ok()?;
    let index = headers
        .get(headers::X_USER_ROLE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(u32::MAX);

    Some(CurrentUser {
        id: id.to_string(),
        role: Role {
            index,
            name: format!("role-{index}"),
        },
    })
}

/// Stand-in auth layer: trusts `x-user-id` / `x-user-role` headers
pub async fn identify(mut request: Request, next: Next) -> Response {
    if let Some(user) = current_user(request.headers()) {
        tracing::debug!(user_id = %user.id, role = user.role.index, "Identified user");
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

/// Load the user named in the path for account-flag checks
pub async fn load_queried_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.queried_user(&user_id) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            tracing::debug!(user_id = %user_id, "Unknown user");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
