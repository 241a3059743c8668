use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use alcove_kv::KvError;

use crate::mailer::MailError;

/// Everything a handler can fail with. Each variant carries the short error
/// code the client sees; detection converts straight into a structured
/// response, nothing propagates past the handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    Validation(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("unauthenticated: {0}")]
    Auth(&'static str),

    #[error("rate limited")]
    RateLimited,

    #[error(transparent)]
    Store(#[from] KvError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(code) => (StatusCode::BAD_REQUEST, *code),
            ApiError::NotFound(code) => (StatusCode::NOT_FOUND, *code),
            ApiError::Conflict(code) => (StatusCode::CONFLICT, *code),
            ApiError::Auth(code) => (StatusCode::UNAUTHORIZED, *code),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT"),
            ApiError::Store(e) => {
                error!("store failure: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            ApiError::Mail(e) => {
                error!("mail delivery failure: {}", e);
                (StatusCode::BAD_GATEWAY, "MAIL_FAILED")
            }
            ApiError::Internal(e) => {
                error!("internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        };
        (status, Json(json!({ "ok": false, "error": code }))).into_response()
    }
}
