use serde::{Deserialize, Serialize};

use crate::models::{DmMessage, PublicKeyJwk};

// -- Generic --

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendCodeRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteSetupRequest {
    pub email: String,
    pub name: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Profile --

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: String,
    pub username: String,
    pub name: String,
    pub avatar: String,
    pub about: String,
    pub badges: Vec<String>,
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub about: Option<String>,
    pub badges: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub name: String,
    pub avatar: String,
    pub badges: Vec<String>,
    pub about: String,
}

#[derive(Debug, Serialize)]
pub struct PublicUserResponse {
    pub ok: bool,
    pub user: PublicUser,
}

// -- Public key exchange --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SetKeyRequest {
    pub pub_jwk: PublicKeyJwk,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResponse {
    pub pub_jwk: Option<PublicKeyJwk>,
}

// -- Sessions --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub id_short: String,
    pub current: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionEntry>,
}

// -- DMs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DmInitRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DmInitResponse {
    pub ok: bool,
    pub thread_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DmSendRequest {
    pub thread_id: String,
    pub nonce: String,
    pub ciphertext: String,
}

#[derive(Debug, Serialize)]
pub struct DmSendResponse {
    pub ok: bool,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmFetchQuery {
    pub thread_id: String,
    #[serde(default)]
    pub after: i64,
}

#[derive(Debug, Serialize)]
pub struct DmFetchResponse {
    pub ok: bool,
    pub messages: Vec<DmMessage>,
}
