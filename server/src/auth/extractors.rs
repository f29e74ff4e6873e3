use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::{authenticate, Credentials, Identity};
use crate::state::AppState;
use crate::utils::error::AppError;

/// The caller, if any. A header that is present but invalid is rejected
/// rather than treated as anonymous.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

/// The caller; anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };

        let header = header
            .to_str()
            .map_err(|_| AppError::AuthError("Invalid authorization header".to_string()))?;
        let credentials = Credentials::from_header(header)?;
        let identity = authenticate(state.store.as_ref(), &credentials).await?;

        Ok(Self(Some(identity)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(identity) = MaybeUser::from_request_parts(parts, state).await?;
        identity
            .map(Self)
            .ok_or_else(AppError::authentication_required)
    }
}
