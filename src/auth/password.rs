use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hashes `password` with bcrypt. `cost` comes from `BCRYPT_COST` and must lie
/// in `4..=31`; anything else is reported as an internal error.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a stored digest. A malformed digest is an
/// internal error, a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, password_digest: &str) -> Result<bool, AppError> {
    verify(password, password_digest)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
