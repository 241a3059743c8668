use sha2::{Digest, Sha256};

pub const THREAD_ID_CHARS: usize = 32;

/// Deterministic two-party thread id: sort the pair, join with a fixed
/// separator, SHA-256, keep the first 32 hex chars. Either participant
/// derives the same id independently, so resuming a conversation needs no
/// registry lookup.
pub fn thread_id(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let digest = Sha256::digest(format!("{}|{}", lo, hi).as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(THREAD_ID_CHARS);
    id
}
