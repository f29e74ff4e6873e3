use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::Method;
use axum::response::Response;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::handlers::load_event;
use crate::models::{AttendeeFilter, NewAttendee};
use crate::pagination::{Links, Pagination, PaginationQuery};
use crate::policy::{authorize, Action};
use crate::state::AppState;
use crate::store::StoreError;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

const RESOURCE: &str = "attendee";

fn already_registered() -> AppError {
    AppError::Conflict("You are already registered as an attendee for this event".to_string())
}

/// `GET /eventos/{id}/asistentes`. Authenticated; page/size pagination,
/// optional `usuario` filter.
pub async fn list_attendees(
    State(state): State<AppState>,
    method: Method,
    CurrentUser(caller): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
    OriginalUri(uri): OriginalUri,
    pagination: Result<Query<PaginationQuery>, QueryRejection>,
    filter: Result<Query<AttendeeFilter>, QueryRejection>,
) -> Result<Response, AppError> {
    authorize(Action::from_method(&method), None, Some(&caller), RESOURCE)?;

    let Path(event_id) = path?;
    let Query(pagination) = pagination?;
    let Query(filter) = filter?;

    let user_id = filter
        .user_id()
        .map_err(|_| AppError::ValidationError("usuario must be a valid user id".to_string()))?;

    let pagination = Pagination::page_number(&pagination);
    let slice = state
        .store
        .list_attendees(event_id, user_id, pagination.window())
        .await?;

    let links = Links::new(uri.path()).keep("usuario", filter.user.as_deref());
    Ok(success(pagination.into_page(slice, &links), "Attendees retrieved"))
}

/// `POST /eventos/{id}/asistentes/registro`. Registers the caller; a user
/// can hold at most one registration per event.
pub async fn register_attendee(
    State(state): State<AppState>,
    method: Method,
    CurrentUser(caller): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(event_id) = path?;
    let store = state.store.as_ref();

    if store.attendee_exists(event_id, caller.user_id).await? {
        warn!(event_id = %event_id, user_id = %caller.user_id, "Duplicate registration");
        return Err(already_registered());
    }

    load_event(store, event_id).await?;
    let registration = NewAttendee {
        event_id,
        user_id: caller.user_id,
    };
    authorize(Action::from_method(&method), Some(&registration), Some(&caller), RESOURCE)?;

    // The unique constraint decides races the pre-check above cannot see.
    let attendee = match store
        .insert_attendee(registration.event_id, registration.user_id)
        .await
    {
        Ok(attendee) => attendee,
        Err(StoreError::UniqueViolation(_)) => {
            warn!(event_id = %event_id, user_id = %caller.user_id, "Concurrent duplicate registration");
            return Err(already_registered());
        }
        Err(StoreError::ForeignKeyViolation(_)) => {
            return Err(AppError::NotFound(format!(
                "Event with id '{}' was not found",
                event_id
            )));
        }
        Err(e) => return Err(e.into()),
    };
    info!(event_id = %event_id, user_id = %caller.user_id, "Attendee registered");

    Ok(created(attendee, "Attendance registered"))
}
