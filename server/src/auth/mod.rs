//! Identity provider: account registration, credential checks and the
//! request extractors that turn an `Authorization` header into an [`Identity`].

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{NewUser, RegisterUser, TokenRequest, User};
use crate::store::{Store, StoreError, EMAIL_CONSTRAINT, USERNAME_CONSTRAINT};
use crate::utils::error::AppError;

pub mod credentials;
pub mod extractors;
pub mod password;

pub use credentials::Credentials;
pub use extractors::{CurrentUser, MaybeUser};

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

const USERNAME_TAKEN: &str = "A user with that username already exists";
const EMAIL_TAKEN: &str = "A user with that email already exists";

pub async fn register(store: &dyn Store, payload: RegisterUser) -> Result<User, AppError> {
    payload.validate()?;
    password::validate_password(&payload.password, &payload.username)?;

    if store.username_exists(&payload.username).await? {
        return Err(AppError::ValidationError(USERNAME_TAKEN.to_string()));
    }
    if store.email_exists(&payload.email).await? {
        return Err(AppError::ValidationError(EMAIL_TAKEN.to_string()));
    }

    let password_hash = run_blocking(move || password::hash_password(&payload.password)).await?;

    let new_user = NewUser {
        username: payload.username,
        email: payload.email,
        password_hash,
        first_name: payload.first_name.unwrap_or_default(),
        last_name: payload.last_name.unwrap_or_default(),
    };

    match store.insert_user(new_user).await {
        Ok(user) => {
            info!(user_id = %user.id, username = %user.username, "User registered");
            Ok(user)
        }
        // A concurrent registration won the race after the pre-checks.
        Err(StoreError::UniqueViolation(constraint)) if constraint == USERNAME_CONSTRAINT => {
            Err(AppError::ValidationError(USERNAME_TAKEN.to_string()))
        }
        Err(StoreError::UniqueViolation(constraint)) if constraint == EMAIL_CONSTRAINT => {
            Err(AppError::ValidationError(EMAIL_TAKEN.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn authenticate(store: &dyn Store, credentials: &Credentials) -> Result<Identity, AppError> {
    match credentials {
        Credentials::Token(token) => {
            let user = store.find_user_by_token(token).await?.ok_or_else(|| {
                warn!("Rejected unknown API token");
                AppError::AuthError("Invalid token".to_string())
            })?;
            Ok(Identity::from(&user))
        }
        Credentials::Basic { username, password } => {
            check_password(store, username, password).await.map(|user| Identity::from(&user))
        }
    }
}

/// Exchanges a username and password for a new API token.
pub async fn issue_token(store: &dyn Store, request: TokenRequest) -> Result<String, AppError> {
    let user = check_password(store, &request.username, &request.password).await?;

    let token = credentials::generate_token()?;
    store.insert_token(&token, user.id).await?;
    info!(user_id = %user.id, "API token issued");

    Ok(token)
}

async fn check_password(store: &dyn Store, username: &str, password: &str) -> Result<User, AppError> {
    let invalid = || AppError::AuthError("Invalid username or password".to_string());

    let Some(credentials) = store.find_credentials(username).await? else {
        warn!(username = %username, "Login attempt for unknown user");
        return Err(invalid());
    };

    let hash = credentials.password_hash;
    let password = password.to_string();
    let matches = run_blocking(move || Ok(password::verify_password(&hash, &password))).await?;

    if matches {
        Ok(credentials.user)
    } else {
        warn!(username = %username, "Login attempt with wrong password");
        Err(invalid())
    }
}

/// Argon2 is CPU bound; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::InternalServerError(format!("blocking task failed: {}", e)))?
}
