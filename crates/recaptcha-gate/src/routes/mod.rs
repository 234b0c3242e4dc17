//! HTTP routes for the demo server.

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::enforce;
use crate::policy::Policy;
use crate::state::AppState;

mod health;
mod protected;
mod validate;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))

        // Standalone verification
        .route("/validate", post(validate::validate_token))

        // Gated submissions
        .merge(gated("/contact", Policy::Unconditional, &state))
        .merge(gated("/comments", Policy::UnlessAuthenticated, &state))
        .merge(gated("/admin/announce", Policy::UnlessAdmin, &state))
        .merge(user_messages(&state))

        .layer(from_fn(protected::identify))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A POST route guarded by `policy`
fn gated(path: &str, policy: Policy, state: &AppState) -> Router<AppState> {
    Router::new()
        .route(path, post(protected::accept))
        .route_layer(from_fn_with_state(state.gate(policy), enforce))
}

/// Messages to a user, gated by that user's account flag
fn user_messages(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/messages", post(protected::accept))
        .route_layer(from_fn_with_state(state.gate(Policy::AccountFlag), enforce))
        .route_layer(from_fn_with_state(state.clone(), protected::load_queried_user))
}
