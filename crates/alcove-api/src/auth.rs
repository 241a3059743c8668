use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::header,
    response::{AppendHeaders, IntoResponse},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use alcove_crypto::password::{hash_password, password_ok, verify_password};
use alcove_crypto::token::signup_code;
use alcove_kv::KvClient;
use alcove_types::api::{
    CompleteSetupRequest, LoginRequest, OkResponse, SendCodeRequest, VerifyCodeRequest,
};
use alcove_types::models::{PendingRegistration, User};

use crate::error::ApiError;
use crate::mailer::Mailer;
use crate::ratelimit::{self, ClientIp};
use crate::session::{self, SESSION_COOKIE};
use crate::validate;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub kv: KvClient,
    pub mailer: Mailer,
    pub site_name: String,
}

const AUTH_BUCKET: &str = "auth";
const AUTH_LIMIT: i64 = 80;
const AUTH_WINDOW_SECS: u64 = 60;

/// Pending-registration TTLs: 5 minutes to enter the emailed code, then 10
/// more to finish profile setup once verified.
const CODE_TTL_SECS: u64 = 300;
const VERIFIED_TTL_SECS: u64 = 600;

/// First registration step: stash a pending record and email a one-time
/// code. Calling again before expiry overwrites record and code; rate
/// limiting is the only throttle.
pub async fn send_code(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    ratelimit::require(&state.kv, &ip, AUTH_BUCKET, AUTH_LIMIT, AUTH_WINDOW_SECS).await?;

    let email = validate::normalize_email(&req.email);
    if !validate::email_ok(&email) {
        return Err(ApiError::Validation("BAD_EMAIL"));
    }
    if !password_ok(&req.password) {
        return Err(ApiError::Validation("BAD_PASSWORD"));
    }
    if state.kv.user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("ACCOUNT_EXISTS"));
    }

    let code = signup_code();
    let pending = PendingRegistration {
        code: code.clone(),
        pw_hash: hash_password(&req.password)?,
        verified: false,
    };
    state
        .kv
        .put_pending_registration(&email, &pending, CODE_TTL_SECS)
        .await?;

    state
        .mailer
        .send(
            &email,
            &format!("{} sign-in code", state.site_name),
            &format!("<b>{}</b><p>Valid for 5 minutes</p>", code),
        )
        .await?;

    Ok(Json(OkResponse::ok()))
}

/// Second step: exact string match against the stored code. A match rewrites
/// the pending record as verified with a fresh TTL; a mismatch changes
/// nothing.
pub async fn verify_code(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    ratelimit::require(&state.kv, &ip, AUTH_BUCKET, AUTH_LIMIT, AUTH_WINDOW_SECS).await?;

    let email = validate::normalize_email(&req.email);
    let mut pending = state
        .kv
        .pending_registration(&email)
        .await?
        .ok_or(ApiError::NotFound("NO_PENDING"))?;

    if pending.code != req.code {
        return Err(ApiError::Validation("INVALID_CODE"));
    }

    pending.verified = true;
    state
        .kv
        .put_pending_registration(&email, &pending, VERIFIED_TTL_SECS)
        .await?;

    Ok(Json(OkResponse::ok()))
}

/// Final step: materialize the account. Record first, username index second,
/// pending-record deletion last; a crash mid-sequence leaves at worst an
/// unindexed user record, which read paths treat as "not found". Ends with
/// a live session.
pub async fn complete_setup(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<CompleteSetupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ratelimit::require(&state.kv, &ip, AUTH_BUCKET, AUTH_LIMIT, AUTH_WINDOW_SECS).await?;

    let email = validate::normalize_email(&req.email);
    let name = req.name.trim().to_string();
    let username = validate::normalize_username(&req.username);

    if !validate::name_ok(&name) {
        return Err(ApiError::Validation("BAD_NAME"));
    }
    if !validate::username_ok(&username) {
        return Err(ApiError::Validation("BAD_USERNAME"));
    }
    if state.kv.email_for_username(&username).await?.is_some() {
        return Err(ApiError::Conflict("USERNAME_TAKEN"));
    }

    let pending = state.kv.pending_registration(&email).await?;
    let Some(pending) = pending.filter(|p| p.verified) else {
        return Err(ApiError::NotFound("NO_PENDING"));
    };

    let now = chrono::Utc::now().timestamp_millis();
    let user = User {
        email: email.clone(),
        username: username.clone(),
        name,
        pw_hash: pending.pw_hash,
        about: String::new(),
        badges: Vec::new(),
        avatar: String::new(),
        pub_jwk: None,
        created_at: now,
        updated_at: now,
    };

    state.kv.put_user(&user).await?;
    state.kv.bind_username(&username, &email).await?;
    state.kv.delete_pending_registration(&email).await?;

    info!("account created for {}", username);

    let token = session::issue(&state.kv, &email).await?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, session::session_cookie(&token))]),
        Json(OkResponse::ok()),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ratelimit::require(&state.kv, &ip, AUTH_BUCKET, AUTH_LIMIT, AUTH_WINDOW_SECS).await?;

    let email = validate::normalize_email(&req.email);
    let user = state
        .kv
        .user_by_email(&email)
        .await?
        .ok_or(ApiError::NotFound("NO_ACCOUNT"))?;

    if !verify_password(&req.password, &user.pw_hash) {
        return Err(ApiError::Auth("BAD_CREDENTIALS"));
    }

    let token = session::issue(&state.kv, &email).await?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, session::session_cookie(&token))]),
        Json(OkResponse::ok()),
    ))
}

/// Revokes the cookie's session if it carries one; always clears the
/// cookie. Deliberately does not require a valid session.
pub async fn logout(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    ratelimit::require(&state.kv, &ip, AUTH_BUCKET, AUTH_LIMIT, AUTH_WINDOW_SECS).await?;

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        session::revoke(&state.kv, cookie.value()).await?;
    }
    Ok((
        AppendHeaders([(header::SET_COOKIE, session::clear_session_cookie())]),
        Json(OkResponse::ok()),
    ))
}
