//! HTTP routes

mod auth;
mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::email::EmailSender;
use crate::state::AppState;

/// Create the router with all routes
pub fn create_router<E>(state: Arc<AppState<E>>) -> Router
where
    E: EmailSender + 'static,
{
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/auth/request-code", post(auth::request_code))
        .route("/auth/verify-code", post(auth::verify_code))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
