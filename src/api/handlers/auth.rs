//! Login, registration and account endpoints.

use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, warn};

use crate::api::{ApiJson, AppState, CurrentUser};
use crate::auth::{AuthError, PublicUser};
use crate::cache::ADMIN_USERS_KEY;
use crate::error::{ApiError, Result};
use crate::models::{
    ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, TokenResponse,
};

/// Handler for POST /auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let Some(user) = state.users.authenticate(&req.username, &req.password).await else {
        warn!(username = %req.username, "failed login attempt");
        return Err(AuthError::InvalidCredentials.into());
    };
    if user.disabled {
        return Err(AuthError::Inactive.into());
    }

    let token = state.tokens.create_token(&user.username, None)?;
    info!(username = %user.username, "user logged in");
    Ok(Json(TokenResponse::bearer(
        token,
        state.tokens.default_ttl().num_seconds(),
    )))
}

/// Handler for POST /auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>)> {
    req.validate()?;

    let user = state
        .users
        .register(
            &req.username,
            Some(req.email.trim()),
            &req.password,
            req.full_name.as_deref(),
        )
        .await?;
    state.cache.write().await.invalidate(&[ADMIN_USERS_KEY]);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for POST /auth/change-password
pub async fn change_password_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;

    state
        .users
        .change_password(&user.username, &req.old_password, &req.new_password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                ApiError::validation("old_password", "Incorrect old password")
            }
            other => other.into(),
        })?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Handler for GET /auth/me
pub async fn me_handler(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.to_public())
}
