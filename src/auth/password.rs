use crate::error::AppError;

/// Hashes `password` with bcrypt at the given work factor.
///
/// Costs outside bcrypt's accepted range (4..=31) are reported as an internal
/// error rather than clamped.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Checks `password` against a stored bcrypt hash.
///
/// A stored value that is not a bcrypt hash is an error, not a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    Ok(bcrypt::verify(password, password_hash)?)
}
