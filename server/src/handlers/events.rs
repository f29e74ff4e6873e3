use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::Method;
use axum::response::Response;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::auth::{CurrentUser, MaybeUser};
use crate::handlers::load_event;
use crate::models::{CreateEvent, EventPatch};
use crate::policy::{authorize, Action};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, no_content, success};

const RESOURCE: &str = "event";

/// `GET /eventos`
pub async fn list_events(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(caller): MaybeUser,
) -> Result<Response, AppError> {
    authorize(Action::from_method(&method), None, caller.as_ref(), RESOURCE)?;

    let events = state.store.list_events().await?;
    Ok(success(events, "Events retrieved"))
}

/// `POST /eventos`. The caller becomes the organizer.
pub async fn create_event(
    State(state): State<AppState>,
    method: Method,
    CurrentUser(caller): CurrentUser,
    payload: Result<Json<CreateEvent>, JsonRejection>,
) -> Result<Response, AppError> {
    authorize(Action::from_method(&method), None, Some(&caller), RESOURCE)?;

    let Json(payload) = payload?;
    payload.validate()?;

    let event = state
        .store
        .insert_event(payload.into_new_event(caller.user_id))
        .await?;
    info!(event_id = %event.id, organizer_id = %caller.user_id, "Event created");

    Ok(created(event, "Event created"))
}

/// `GET /eventos/{id}`
pub async fn get_event(
    State(state): State<AppState>,
    method: Method,
    MaybeUser(caller): MaybeUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = path?;
    let event = load_event(state.store.as_ref(), id).await?;
    authorize(Action::from_method(&method), Some(&event), caller.as_ref(), RESOURCE)?;

    Ok(success(event, "Event retrieved"))
}

/// `PATCH /eventos/{id}`. Organizer only; applies `nombre` and `fecha` and
/// nothing else.
pub async fn update_event(
    State(state): State<AppState>,
    method: Method,
    CurrentUser(caller): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(id) = path?;
    let event = load_event(state.store.as_ref(), id).await?;
    authorize(Action::from_method(&method), Some(&event), Some(&caller), RESOURCE)?;

    let Json(patch) = payload?;
    patch.validate()?;
    let patch = patch.normalized();
    if patch.is_empty() {
        return Ok(success(event, "Event updated"));
    }

    let updated = state
        .store
        .update_event(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{}' was not found", id)))?;
    info!(event_id = %id, "Event updated");

    Ok(success(updated, "Event updated"))
}

/// `DELETE /eventos/{id}`. Organizer only; attendees and comments go with it.
pub async fn delete_event(
    State(state): State<AppState>,
    method: Method,
    CurrentUser(caller): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = path?;
    let event = load_event(state.store.as_ref(), id).await?;
    authorize(Action::from_method(&method), Some(&event), Some(&caller), RESOURCE)?;

    if !state.store.delete_event(id).await? {
        return Err(AppError::NotFound(format!("Event with id '{}' was not found", id)));
    }
    info!(event_id = %id, "Event deleted");

    Ok(no_content())
}
