use axum::{
    Extension, Json,
    extract::{Query, State},
};

use alcove_crypto::digest::thread_id;
use alcove_types::api::{
    DmFetchQuery, DmFetchResponse, DmInitRequest, DmInitResponse, DmSendRequest, DmSendResponse,
};
use alcove_types::models::DmMessage;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::ratelimit::{self, ClientIp};
use crate::validate;

const DM_BUCKET: &str = "dm";
const DM_LIMIT: i64 = 120;
const DM_WINDOW_SECS: u64 = 60;

const MIN_THREAD_ID_CHARS: usize = 16;
const MAX_CIPHERTEXT_CHARS: usize = 20_000;
/// List indexes are inclusive: trimming to 0..=500 retains 501 ids,
/// reading 0..=80 pages over the 81 most recent.
const RETAINED_IDS: i64 = 500;
const FETCH_WINDOW: i64 = 80;

fn thread_id_ok(id: &str) -> bool {
    id.len() >= MIN_THREAD_ID_CHARS
}

/// Resolve the peer and register the deterministic thread id in both
/// participants' thread sets. Safe to call repeatedly; either side derives
/// the same id on its own.
pub async fn init_thread(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<DmInitRequest>,
) -> Result<Json<DmInitResponse>, ApiError> {
    ratelimit::require(&state.kv, &ip, DM_BUCKET, DM_LIMIT, DM_WINDOW_SECS).await?;

    let peer = validate::normalize_username(&req.username);
    if peer.is_empty() {
        return Err(ApiError::Validation("BAD_USER"));
    }
    let peer_email = state
        .kv
        .email_for_username(&peer)
        .await?
        .ok_or(ApiError::NotFound("NO_USER"))?;

    let id = thread_id(&user.email, &peer_email);
    state.kv.add_thread(&user.email, &id).await?;
    state.kv.add_thread(&peer_email, &id).await?;

    Ok(Json(DmInitResponse {
        ok: true,
        thread_id: id,
    }))
}

/// Store-and-forward for one opaque ciphertext. The store's atomic
/// increment hands out the message id, so concurrent senders in a thread
/// get distinct consecutive ids; the id list is then trimmed to the
/// retention window.
pub async fn send_message(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<DmSendRequest>,
) -> Result<Json<DmSendResponse>, ApiError> {
    ratelimit::require(&state.kv, &ip, DM_BUCKET, DM_LIMIT, DM_WINDOW_SECS).await?;

    if !thread_id_ok(&req.thread_id) {
        return Err(ApiError::Validation("BAD_THREAD"));
    }
    if req.nonce.is_empty() || req.ciphertext.is_empty() {
        return Err(ApiError::Validation("BAD_PAYLOAD"));
    }
    if req.ciphertext.chars().count() > MAX_CIPHERTEXT_CHARS {
        return Err(ApiError::Validation("TOO_LARGE"));
    }

    let id = state.kv.next_message_id(&req.thread_id).await?;
    let message = DmMessage {
        id,
        from: user.email,
        ts: chrono::Utc::now().timestamp_millis(),
        nonce: req.nonce,
        ciphertext: req.ciphertext,
    };

    state.kv.put_message(&req.thread_id, &message).await?;
    state.kv.push_message_id(&req.thread_id, id).await?;
    state
        .kv
        .trim_message_ids(&req.thread_id, RETAINED_IDS)
        .await?;

    Ok(Json(DmSendResponse { ok: true, id }))
}

/// Page over the recent window: ids newer than `after`, ascending. An id
/// whose record has gone missing is skipped, not an error; history beyond
/// the retention window is simply unavailable.
pub async fn fetch_messages(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Extension(_user): Extension<CurrentUser>,
    Query(query): Query<DmFetchQuery>,
) -> Result<Json<DmFetchResponse>, ApiError> {
    ratelimit::require(&state.kv, &ip, DM_BUCKET, DM_LIMIT, DM_WINDOW_SECS).await?;

    if !thread_id_ok(&query.thread_id) {
        return Err(ApiError::Validation("BAD_THREAD"));
    }

    let mut ids = state
        .kv
        .recent_message_ids(&query.thread_id, FETCH_WINDOW)
        .await?;
    ids.retain(|id| *id > query.after);
    ids.sort_unstable();

    let mut messages = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(message) = state.kv.message(&query.thread_id, id).await? {
            messages.push(message);
        }
    }

    Ok(Json(DmFetchResponse { ok: true, messages }))
}
