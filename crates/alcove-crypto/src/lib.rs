/// Alcove crypto helpers.
///
/// Everything the server itself needs: credential records, opaque session
/// tokens, one-time signup codes and deterministic thread digests. DM
/// payload encryption is deliberately absent; clients encrypt, the server
/// only relays ciphertext.
pub mod digest;
pub mod password;
pub mod token;
