use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::Method;
use axum::response::Response;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::auth::{CurrentUser, MaybeUser};
use crate::handlers::load_event;
use crate::models::CreateComment;
use crate::pagination::{Links, Pagination, PaginationQuery};
use crate::policy::{authorize, Action};
use crate::state::AppState;
use crate::store::StoreError;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

const RESOURCE: &str = "comment";

/// `GET /eventos/{id}/comentarios`. Public; offset/limit pagination, newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(caller): MaybeUser,
    path: Result<Path<Uuid>, PathRejection>,
    OriginalUri(uri): OriginalUri,
    pagination: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    authorize(Action::from_method(&method), None, caller.as_ref(), RESOURCE)?;

    let Path(event_id) = path?;
    let Query(pagination) = pagination?;

    let pagination = Pagination::limit_offset(&pagination);
    let slice = state
        .store
        .list_comments(event_id, pagination.window())
        .await?;

    Ok(success(
        pagination.into_page(slice, &Links::new(uri.path())),
        "Comments retrieved",
    ))
}

/// `POST /eventos/{id}/comentarios/crear`. The event comes from the path and
/// the author is always the caller.
pub async fn create_comment(
    State(state): State<AppState>,
    method: Method,
    CurrentUser(caller): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateComment>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(event_id) = path?;
    let Json(payload) = payload?;
    payload.validate()?;

    let event = load_event(state.store.as_ref(), event_id).await?;
    let new_comment = payload.into_new_comment(event.id, caller.user_id);
    authorize(Action::from_method(&method), Some(&new_comment), Some(&caller), RESOURCE)?;

    let comment = match state.store.insert_comment(new_comment).await {
        Ok(comment) => comment,
        Err(StoreError::ForeignKeyViolation(_)) => {
            return Err(AppError::NotFound(format!(
                "Event with id '{}' was not found",
                event_id
            )));
        }
        Err(e) => return Err(e.into()),
    };
    info!(comment_id = %comment.id, event_id = %event_id, author_id = %caller.user_id, "Comment created");

    Ok(created(comment, "Comment created"))
}
