use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::utils::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AppError::InternalServerError(format!("salt generation failed: {}", e)))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::InternalServerError(format!("salt encoding failed: {}", e)))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(format!("password hashing failed: {}", e)))?
        .to_string();

    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn validate_password(password: &str, username: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError(format!(
            "password must contain at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError(
            "password may not be entirely numeric".to_string(),
        ));
    }
    if password.to_lowercase() == username.to_lowercase() {
        return Err(AppError::ValidationError(
            "password is too similar to the username".to_string(),
        ));
    }
    Ok(())
}
