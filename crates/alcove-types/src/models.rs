use serde::{Deserialize, Serialize};

/// P-256 ECDH public key in JWK form, as exchanged between DM clients.
/// The server stores and relays it; it never derives anything from it.
/// Optional JWK members (`ext`, `key_ops`, ...) are accepted and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
}

impl PublicKeyJwk {
    pub fn is_valid(&self) -> bool {
        self.kty == "EC" && self.crv == "P-256" && !self.x.is_empty() && !self.y.is_empty()
    }
}

/// Account record, stored under `user:email:{email}`. The username index
/// key `user:username:{username}` maps back to the email and is written
/// together with this record (record first, index second).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub username: String,
    pub name: String,
    pub pw_hash: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_jwk: Option<PublicKeyJwk>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Registration-in-progress state, stored under `pending:{email}` with a
/// short TTL. Consumed (deleted) when the account is materialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRegistration {
    pub code: String,
    pub pw_hash: String,
    #[serde(default)]
    pub verified: bool,
}

/// A relayed DM. `nonce` and `ciphertext` are opaque to the server;
/// encryption and decryption happen entirely on the clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmMessage {
    pub id: i64,
    pub from: String,
    pub ts: i64,
    pub nonce: String,
    pub ciphertext: String,
}
