//! Data-access interface used by the handlers.
//!
//! Two implementations exist: [`PgStore`] over PostgreSQL and [`MemoryStore`]
//! for local runs and tests. Both enforce one attendee per (event, user) and
//! cascade event deletion to attendees and comments.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Attendee, Comment, Event, EventPatch, NewComment, NewEvent, NewUser, User, UserCredentials,
};
use crate::pagination::{Slice, Window};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const USERNAME_CONSTRAINT: &str = "users_username_unique";
pub const EMAIL_CONSTRAINT: &str = "users_email_lower_unique";
pub const ATTENDEE_CONSTRAINT: &str = "attendees_event_user_unique";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(constraint);
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_credentials(&self, username: &str) -> StoreResult<Option<UserCredentials>>;
    async fn username_exists(&self, username: &str) -> StoreResult<bool>;
    /// Case-insensitive.
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;
    async fn insert_token(&self, token: &str, user_id: Uuid) -> StoreResult<()>;
    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>>;

    /// All events in creation order.
    async fn list_events(&self) -> StoreResult<Vec<Event>>;
    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event>;
    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>>;
    /// Applies the present fields of `patch`; `None` when the event is gone.
    async fn update_event(&self, id: Uuid, patch: &EventPatch) -> StoreResult<Option<Event>>;
    /// Removes the event with its attendees and comments. `false` when nothing was deleted.
    async fn delete_event(&self, id: Uuid) -> StoreResult<bool>;

    async fn attendee_exists(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    /// Fails with [`StoreError::UniqueViolation`] on a second registration and
    /// [`StoreError::ForeignKeyViolation`] when the event or user is missing.
    async fn insert_attendee(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Attendee>;
    /// Ordered by the user's first name, last name, then username.
    async fn list_attendees(
        &self,
        event_id: Uuid,
        user_id: Option<Uuid>,
        window: Window,
    ) -> StoreResult<Slice<Attendee>>;

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment>;
    /// Newest first.
    async fn list_comments(&self, event_id: Uuid, window: Window) -> StoreResult<Slice<Comment>>;
}
