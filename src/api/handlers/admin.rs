//! User administration endpoints (admin only).

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, warn};

use crate::api::{AdminUser, AppState};
use crate::auth::{PublicUser, ADMIN_USERNAME};
use crate::cache::ADMIN_USERS_KEY;
use crate::error::{ApiError, Result};

/// Handler for GET /admin/users
///
/// Cache-aside; invalidated whenever a user is added or toggled.
pub async fn list_users_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Json<Vec<PublicUser>> {
    // The guard spans the store read so a concurrent invalidation cannot
    // be overwritten by a stale list.
    let mut cache = state.cache.write().await;

    if let Some(cached) = cache.get(ADMIN_USERS_KEY) {
        match serde_json::from_value::<Vec<PublicUser>>(cached) {
            Ok(users) => return Json(users),
            Err(e) => warn!(error = %e, "discarding unreadable cached user list"),
        }
    }

    let users = state.users.list().await;
    match serde_json::to_value(&users) {
        Ok(value) => cache.set(ADMIN_USERS_KEY, value, None),
        Err(e) => warn!(error = %e, "failed to cache user list"),
    }
    Json(users)
}

async fn set_disabled(state: &AppState, username: &str, disabled: bool) -> Result<PublicUser> {
    if disabled && username == ADMIN_USERNAME {
        return Err(ApiError::validation(
            "username",
            "The admin account cannot be disabled",
        ));
    }

    let user = state.users.set_disabled(username, disabled).await?;
    state.cache.write().await.invalidate(&[ADMIN_USERS_KEY]);
    Ok(user)
}

/// Handler for POST /admin/users/:username/disable
pub async fn disable_user_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
) -> Result<Json<PublicUser>> {
    let user = set_disabled(&state, &username, true).await?;
    info!(admin = %admin.username, username = %username, "user disabled");
    Ok(Json(user))
}

/// Handler for POST /admin/users/:username/enable
pub async fn enable_user_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
) -> Result<Json<PublicUser>> {
    let user = set_disabled(&state, &username, false).await?;
    info!(admin = %admin.username, username = %username, "user enabled");
    Ok(Json(user))
}
