//! Standalone token validation endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::middleware::GateErrorResponse;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ValidateRequest {
    token: Option<String>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    success: bool,
}

/// Verify a token directly, outside any gate.
///
/// A rejected or absent token answers 400 with its message key.
pub async fn validate_token(
    State(state): State<AppState>,
    Json(payload): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, GateErrorResponse> {
    state
        .verifier
        .verify(&state.gate_config, payload.token.as_deref())
        .await?
        .into_result()?;

    Ok(Json(ValidateResponse { success: true }))
}
