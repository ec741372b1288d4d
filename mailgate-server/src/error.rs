//! Service error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email not allowed")]
    Forbidden,

    #[error("Please wait before requesting another code")]
    RateLimited,

    #[error("No active code. Request a new code")]
    NoActiveChallenge,

    #[error("Code expired. Request a new code")]
    ChallengeExpired,

    #[error("Too many incorrect attempts. Request a new code")]
    TooManyAttempts,

    #[error("Invalid code")]
    InvalidCode,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Email delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Email not allowed"),
            AuthError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Please wait before requesting another code",
            ),
            AuthError::NoActiveChallenge => (
                StatusCode::UNAUTHORIZED,
                "No active code. Request a new code",
            ),
            AuthError::ChallengeExpired => (
                StatusCode::UNAUTHORIZED,
                "Code expired. Request a new code",
            ),
            AuthError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many incorrect attempts. Request a new code",
            ),
            AuthError::InvalidCode => (StatusCode::UNAUTHORIZED, "Invalid code"),
            AuthError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired session")
            }
            AuthError::DeliveryFailed(msg) => {
                tracing::error!("Email delivery failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Could not send the code")
            }
            AuthError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
