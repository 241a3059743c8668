use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::{AppendHeaders, IntoResponse},
};

use alcove_crypto::token::session_token;
use alcove_kv::{KvClient, KvError};
use alcove_types::api::{OkResponse, SessionEntry, SessionsResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub const SESSION_COOKIE: &str = "sid";
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// Mint a session: opaque token -> owning email with a fixed 30-day TTL
/// (never refreshed on use), plus membership in the user's session set.
/// The set is written second; a crash in between leaves a valid session
/// that bulk revocation won't see. Tolerated drift: the entry itself is
/// always the source of truth.
pub async fn issue(kv: &KvClient, email: &str) -> Result<String, KvError> {
    let token = session_token();
    kv.put_session(&token, email, SESSION_TTL_SECS).await?;
    kv.add_user_session(email, &token).await?;
    Ok(token)
}

/// Plain lookup. Absence (including post-expiry) means "unauthenticated",
/// never an error.
pub async fn validate(kv: &KvClient, token: &str) -> Result<Option<String>, KvError> {
    kv.session_email(token).await
}

pub async fn revoke(kv: &KvClient, token: &str) -> Result<(), KvError> {
    kv.delete_session(token).await
}

/// Delete every session the user's set knows about, then the set itself.
/// Orphaned members (entry already expired) delete as a no-op.
pub async fn revoke_all(kv: &KvClient, email: &str) -> Result<(), KvError> {
    for token in kv.user_sessions(email).await? {
        kv.delete_session(&token).await?;
    }
    kv.clear_user_sessions(email).await
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Secure; Max-Age={}",
        SESSION_COOKIE, token, SESSION_TTL_SECS
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Secure; Max-Age=0",
        SESSION_COOKIE
    )
}

// -- Handlers --

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let tokens = state.kv.user_sessions(&user.email).await?;
    let sessions = tokens
        .iter()
        .map(|token| SessionEntry {
            id_short: token.chars().take(8).collect(),
            current: *token == user.sid,
        })
        .collect();
    Ok(Json(SessionsResponse { sessions }))
}

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    revoke_all(&state.kv, &user.email).await?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
        Json(OkResponse::ok()),
    ))
}
