use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

use crate::auth::{self, CurrentUser};
use crate::models::{RegisterUser, TokenRequest, TokenResponse};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

/// `POST /usuarios/registro`. Open to anonymous callers.
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;
    let user = auth::register(state.store.as_ref(), payload).await?;

    Ok(created(user, "User registered"))
}

/// `POST /usuarios/token`
pub async fn obtain_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;
    let token = auth::issue_token(state.store.as_ref(), payload).await?;

    Ok(success(TokenResponse { token }, "Token issued"))
}

/// `GET /usuarios/me`
pub async fn current_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Response, AppError> {
    let user = state
        .store
        .find_user(caller.user_id)
        .await?
        .ok_or_else(AppError::authentication_required)?;

    Ok(success(user, "User retrieved"))
}
