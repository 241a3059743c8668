pub mod auth;
pub mod dm;
pub mod error;
pub mod keys;
pub mod mailer;
pub mod middleware;
pub mod profile;
pub mod ratelimit;
pub mod session;
pub mod users;
pub mod validate;

use axum::{
    Router,
    routing::{get, post},
};

use crate::auth::AppState;

/// The full HTTP surface. Session-guarded routes live under `/api`; the
/// registration and login flow is public.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/send-code", post(auth::send_code))
        .route("/auth/verify-code", post(auth::verify_code))
        .route("/auth/setup", post(auth::complete_setup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .with_state(state.clone());

    let protected = Router::new()
        .route(
            "/api/profile",
            get(profile::get_profile).post(profile::update_profile),
        )
        .route("/api/users/{username}", get(users::get_user))
        .route("/api/users/{username}/key", get(keys::get_key))
        .route("/api/keys", post(keys::set_key))
        .route("/api/sessions", get(session::list_sessions))
        .route("/api/sessions/logout-all", post(session::logout_all))
        .route("/api/dm/init", post(dm::init_thread))
        .route("/api/dm/send", post(dm::send_message))
        .route("/api/dm/fetch", get(dm::fetch_messages))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}
