use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

pub const MIN_PASSWORD_CHARS: usize = 8;
/// Upper bound exists to bound the CPU cost of hashing, not for security.
pub const MAX_PASSWORD_CHARS: usize = 72;

pub fn password_ok(password: &str) -> bool {
    let len = password.chars().count();
    (MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&len)
}

/// Hash a password into a self-describing PHC record: algorithm, parameters,
/// salt and derived key joined by `$`. The parameters travel with the record,
/// so they can be raised later without invalidating stored credentials.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// Re-derive with the record's stored parameters and compare in constant
/// time. A malformed or truncated record verifies as false, never errors.
pub fn verify_password(password: &str, record: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(record) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
