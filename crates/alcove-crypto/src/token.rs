use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, RngCore};

/// An opaque, unguessable session identifier. 24 random bytes, base64url
/// without padding: cookie-safe and carries no embedded meaning.
pub fn session_token() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Six-digit one-time code for the registration email.
pub fn signup_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}
