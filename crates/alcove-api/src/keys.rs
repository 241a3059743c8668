use axum::{
    Extension, Json,
    extract::{Path, State},
};

use alcove_types::api::{KeyResponse, OkResponse, SetKeyRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::validate;

/// Fetch a peer's public encryption key by username. An unknown user and a
/// user who hasn't published a key both answer `null`; callers can't
/// distinguish the two.
pub async fn get_key(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<KeyResponse>, ApiError> {
    let username = validate::normalize_username(&username);
    if username.is_empty() {
        return Err(ApiError::Validation("BAD_USER"));
    }

    let Some(email) = state.kv.email_for_username(&username).await? else {
        return Ok(Json(KeyResponse { pub_jwk: None }));
    };
    let Some(record) = state.kv.user_by_email(&email).await? else {
        return Ok(Json(KeyResponse { pub_jwk: None }));
    };

    Ok(Json(KeyResponse {
        pub_jwk: record.pub_jwk,
    }))
}

/// Publish the caller's P-256 ECDH public key. The server validates shape
/// only; it never uses the key itself.
pub async fn set_key(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SetKeyRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    if !req.pub_jwk.is_valid() {
        return Err(ApiError::Validation("BAD_KEY"));
    }

    let mut record = state
        .kv
        .user_by_email(&user.email)
        .await?
        .ok_or(ApiError::NotFound("NO_ACCOUNT"))?;

    record.pub_jwk = Some(req.pub_jwk);
    record.updated_at = chrono::Utc::now().timestamp_millis();
    state.kv.put_user(&record).await?;

    Ok(Json(OkResponse::ok()))
}
