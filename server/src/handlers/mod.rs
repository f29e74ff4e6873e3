use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::models::Event;
use crate::store::Store;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod attendees;
pub mod comments;
pub mod events;
pub mod users;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "eventhub-api",
    };

    success(payload, "Health check successful")
}

pub(crate) async fn load_event(store: &dyn Store, id: Uuid) -> Result<Event, AppError> {
    store
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{}' was not found", id)))
}
