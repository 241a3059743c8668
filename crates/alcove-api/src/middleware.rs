use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::session::{self, SESSION_COOKIE};

/// Identity of the authenticated caller, injected by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub email: String,
    pub sid: String,
}

/// Validate the session cookie and stash the caller's identity in request
/// extensions. A missing or expired session is 401, never a hint about
/// whether anything exists.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let sid = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::Auth("UNAUTHENTICATED"))?;

    let email = session::validate(&state.kv, &sid)
        .await?
        .ok_or(ApiError::Auth("UNAUTHENTICATED"))?;

    req.extensions_mut().insert(CurrentUser { email, sid });
    Ok(next.run(req).await)
}
