use axum::{Extension, Json, extract::State};

use alcove_types::api::{OkResponse, ProfileResponse, UpdateProfileRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::validate;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let record = state
        .kv
        .user_by_email(&user.email)
        .await?
        .ok_or(ApiError::NotFound("NO_ACCOUNT"))?;

    Ok(Json(ProfileResponse {
        email: record.email,
        username: record.username,
        name: record.name,
        avatar: record.avatar,
        about: record.about,
        badges: record.badges,
    }))
}

/// Partial update over the whole record, last write wins. A username change
/// re-points the index before the record is rewritten, matching the
/// record-then-index ordering used at registration.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let mut record = state
        .kv
        .user_by_email(&user.email)
        .await?
        .ok_or(ApiError::NotFound("NO_ACCOUNT"))?;

    let name = match req.name {
        Some(raw) => raw.trim().to_string(),
        None => record.name.clone(),
    };
    let username = match req.username {
        Some(raw) => validate::normalize_username(&raw),
        None => record.username.clone(),
    };
    let about = req.about.unwrap_or_else(|| record.about.clone());
    let badges = match req.badges {
        Some(raw) => validate::filter_badges(&raw),
        None => record.badges.clone(),
    };

    if !validate::name_ok(&name) {
        return Err(ApiError::Validation("BAD_NAME"));
    }
    if !validate::username_ok(&username) {
        return Err(ApiError::Validation("BAD_USERNAME"));
    }
    if !validate::about_ok(&about) {
        return Err(ApiError::Validation("BAD_ABOUT"));
    }

    if username != record.username {
        if state.kv.email_for_username(&username).await?.is_some() {
            return Err(ApiError::Conflict("USERNAME_TAKEN"));
        }
        state.kv.unbind_username(&record.username).await?;
        state.kv.bind_username(&username, &record.email).await?;
    }

    record.name = name;
    record.username = username;
    record.about = about;
    record.badges = badges;
    record.updated_at = chrono::Utc::now().timestamp_millis();

    state.kv.put_user(&record).await?;
    Ok(Json(OkResponse::ok()))
}
