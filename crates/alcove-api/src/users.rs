use axum::{
    Json,
    extract::{Path, State},
};

use alcove_types::api::{PublicUser, PublicUserResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::validate;

/// Exact username lookup, public fields only. A dangling username index
/// (record missing) reads as not-found rather than corruption.
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicUserResponse>, ApiError> {
    let username = validate::normalize_username(&username);
    if username.is_empty() {
        return Err(ApiError::Validation("BAD_USER"));
    }

    let email = state
        .kv
        .email_for_username(&username)
        .await?
        .ok_or(ApiError::NotFound("NOT_FOUND"))?;
    let record = state
        .kv
        .user_by_email(&email)
        .await?
        .ok_or(ApiError::NotFound("NOT_FOUND"))?;

    Ok(Json(PublicUserResponse {
        ok: true,
        user: PublicUser {
            username: record.username,
            name: record.name,
            avatar: record.avatar,
            badges: record.badges,
            about: record.about,
        },
    }))
}
