//! Authentication endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::EmailSender;
use crate::error::AuthError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RequestCodeRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct RequestCodeResponse {
    pub success: bool,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// POST /auth/request-code
///
/// Issues a passcode and hands it to the email collaborator. The code is
/// never part of the response.
pub async fn request_code<E>(
    State(state): State<Arc<AppState<E>>>,
    Json(req): Json<RequestCodeRequest>,
) -> Result<Json<RequestCodeResponse>, AuthError>
where
    E: EmailSender,
{
    let issued = state.otp.issue(&req.email)?;

    state
        .email_sender
        .send_passcode(
            &issued.email,
            &issued.code,
            state.otp_ttl.num_seconds() as u64,
        )
        .map_err(AuthError::DeliveryFailed)?;

    tracing::info!(email = %issued.email, "Login code issued");

    Ok(Json(RequestCodeResponse {
        success: true,
        email: issued.email,
        expires_at: issued.expires_at,
    }))
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub email: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// POST /auth/verify-code
pub async fn verify_code<E>(
    State(state): State<Arc<AppState<E>>>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<SessionResponse>, AuthError>
where
    E: EmailSender,
{
    state.otp.verify_and_consume(&req.email, &req.code)?;
    let session = state.sessions.create_session(&req.email)?;

    tracing::info!(email = %session.email, user_id = %session.user_id, "Session created");

    Ok(Json(SessionResponse {
        token: session.token,
        email: session.email,
        user_id: session.user_id,
        expires_at: session.expires_at,
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserInfo,
}

#[derive(Serialize)]
pub struct UserInfo {
    pub email: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// GET /auth/me
pub async fn me<E>(
    State(state): State<Arc<AppState<E>>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AuthError>
where
    E: EmailSender,
{
    let token = bearer_token(&headers).ok_or(AuthError::Unauthenticated)?;
    let session = state
        .sessions
        .resolve(token)
        .ok_or(AuthError::Unauthenticated)?;

    Ok(Json(MeResponse {
        user: UserInfo {
            email: session.email,
            user_id: session.user_id,
            expires_at: session.expires_at,
        },
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /auth/logout
///
/// Always succeeds: revocation is idempotent and reveals nothing about
/// whether the presented token was valid.
pub async fn logout<E>(
    State(state): State<Arc<AppState<E>>>,
    headers: HeaderMap,
) -> Json<LogoutResponse>
where
    E: EmailSender,
{
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }

    Json(LogoutResponse { success: true })
}

/// Extract the token from an `Authorization: Bearer …` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
