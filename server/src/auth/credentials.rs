use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::utils::error::AppError;

const TOKEN_BYTES: usize = 32;

/// What a caller presented in the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Basic { username: String, password: String },
}

impl Credentials {
    /// Accepts `Token <key>`, `Bearer <key>` and `Basic <base64 user:pass>`.
    pub fn from_header(value: &str) -> Result<Self, AppError> {
        let invalid = |reason: &str| AppError::AuthError(format!("Invalid authorization header: {}", reason));

        let (scheme, rest) = value
            .trim()
            .split_once(' ')
            .ok_or_else(|| invalid("missing credentials"))?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(invalid("missing credentials"));
        }

        match scheme.to_ascii_lowercase().as_str() {
            "token" | "bearer" => {
                if rest.contains(char::is_whitespace) {
                    return Err(invalid("token must not contain spaces"));
                }
                Ok(Credentials::Token(rest.to_string()))
            }
            "basic" => {
                let decoded = STANDARD
                    .decode(rest)
                    .map_err(|_| invalid("basic credentials are not base64"))?;
                let decoded = String::from_utf8(decoded)
                    .map_err(|_| invalid("basic credentials are not UTF-8"))?;
                let (username, password) = decoded
                    .split_once(':')
                    .ok_or_else(|| invalid("basic credentials need user:password"))?;

                Ok(Credentials::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            _ => Err(invalid("unsupported scheme")),
        }
    }
}

/// Random opaque API token, hex encoded.
pub fn generate_token() -> Result<String, AppError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| AppError::InternalServerError(format!("token generation failed: {}", e)))?;
    Ok(hex::encode(bytes))
}
