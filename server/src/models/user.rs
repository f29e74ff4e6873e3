use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

const MAX_USERNAME_LEN: usize = 150;
const MAX_NAME_LEN: usize = 150;

/// Public view of an account. The credential hash lives in [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// "first last (username)", the label attendee listings show.
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    format!("{} {} ({})", first_name, last_name, username)
}

#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Row handed to the store once the password has been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl RegisterUser {
    /// Checks field shapes. Uniqueness and password policy are checked by the identity provider.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;

        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.as_deref().map_or(0, |v| v.chars().count()) > MAX_NAME_LEN {
                return Err(AppError::ValidationError(format!(
                    "{} must be at most {} characters",
                    field, MAX_NAME_LEN
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::ValidationError(format!(
            "username must be between 1 and {} characters",
            MAX_USERNAME_LEN
        )));
    }

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(AppError::ValidationError(
            "username may only contain letters, digits and @/./+/-/_".to_string(),
        ));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::ValidationError("Enter a valid email address".to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}
