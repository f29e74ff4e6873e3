use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::{
    Attendee, AttendeeRow, Comment, Event, EventPatch, NewComment, NewEvent, NewUser, User,
    UserCredentials,
};
use crate::pagination::{Slice, Window};
use crate::store::{
    Store, StoreError, StoreResult, ATTENDEE_CONSTRAINT, EMAIL_CONSTRAINT, USERNAME_CONSTRAINT,
};

#[derive(Debug, Clone)]
struct AttendeeRecord {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    registered_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    users: Vec<UserCredentials>,
    tokens: HashMap<String, Uuid>,
    events: Vec<Event>,
    attendees: Vec<AttendeeRecord>,
    comments: Vec<Comment>,
}

impl State {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().map(|c| &c.user).find(|u| u.id == id)
    }

    /// Same folding as the `lower(email)` index in Postgres.
    fn email_taken(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.users.iter().any(|c| c.user.email.to_lowercase() == email)
    }

    fn event_exists(&self, id: Uuid) -> bool {
        self.events.iter().any(|e| e.id == id)
    }

    fn attendee_row(&self, record: &AttendeeRecord) -> Option<AttendeeRow> {
        let user = self.user(record.user_id)?;
        Some(AttendeeRow {
            id: record.id,
            event_id: record.event_id,
            user_id: record.user_id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            registered_at: record.registered_at,
        })
    }
}

/// Process-local store. Every operation runs under one lock, so uniqueness
/// checks and cascades are atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.lock();

        if state.users.iter().any(|c| c.user.username == user.username) {
            return Err(StoreError::UniqueViolation(USERNAME_CONSTRAINT.to_string()));
        }
        if state.email_taken(&user.email) {
            return Err(StoreError::UniqueViolation(EMAIL_CONSTRAINT.to_string()));
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: Utc::now(),
        };
        state.users.push(UserCredentials {
            user: created.clone(),
            password_hash: user.password_hash,
        });

        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.lock().user(id).cloned())
    }

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<UserCredentials>> {
        let state = self.state.lock();
        Ok(state
            .users
            .iter()
            .find(|c| c.user.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let state = self.state.lock();
        Ok(state.users.iter().any(|c| c.user.username == username))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.state.lock().email_taken(email))
    }

    async fn insert_token(&self, token: &str, user_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock();

        if state.user(user_id).is_none() {
            return Err(StoreError::ForeignKeyViolation(
                "auth_tokens_user_id_fkey".to_string(),
            ));
        }
        if state.tokens.contains_key(token) {
            return Err(StoreError::UniqueViolation("auth_tokens_pkey".to_string()));
        }
        state.tokens.insert(token.to_string(), user_id);

        Ok(())
    }

    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock();
        Ok(state
            .tokens
            .get(token)
            .and_then(|user_id| state.user(*user_id))
            .cloned())
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.state.lock().events.clone())
    }

    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event> {
        let mut state = self.state.lock();

        let organizer_username = state
            .user(event.organizer_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| StoreError::ForeignKeyViolation("events_organizer_id_fkey".to_string()))?;

        let created = Event {
            id: Uuid::new_v4(),
            name: event.name,
            date: event.date,
            description: event.description,
            organizer_id: event.organizer_id,
            organizer_username,
            created_at: Utc::now(),
        };
        state.events.push(created.clone());

        Ok(created)
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let state = self.state.lock();
        Ok(state.events.iter().find(|e| e.id == id).cloned())
    }

    async fn update_event(&self, id: Uuid, patch: &EventPatch) -> StoreResult<Option<Event>> {
        let mut state = self.state.lock();

        let Some(event) = state.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            event.name = name.clone();
        }
        if let Some(date) = patch.date {
            event.date = date;
        }

        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock();

        let before = state.events.len();
        state.events.retain(|e| e.id != id);
        if state.events.len() == before {
            return Ok(false);
        }

        state.attendees.retain(|a| a.event_id != id);
        state.comments.retain(|c| c.event_id != id);

        Ok(true)
    }

    async fn attendee_exists(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let state = self.state.lock();
        Ok(state
            .attendees
            .iter()
            .any(|a| a.event_id == event_id && a.user_id == user_id))
    }

    async fn insert_attendee(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Attendee> {
        let mut state = self.state.lock();

        if state
            .attendees
            .iter()
            .any(|a| a.event_id == event_id && a.user_id == user_id)
        {
            return Err(StoreError::UniqueViolation(ATTENDEE_CONSTRAINT.to_string()));
        }
        if !state.event_exists(event_id) {
            return Err(StoreError::ForeignKeyViolation(
                "attendees_event_id_fkey".to_string(),
            ));
        }

        let record = AttendeeRecord {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            registered_at: Utc::now(),
        };
        let row = state.attendee_row(&record).ok_or_else(|| {
            StoreError::ForeignKeyViolation("attendees_user_id_fkey".to_string())
        })?;
        state.attendees.push(record);

        Ok(row.into())
    }

    async fn list_attendees(
        &self,
        event_id: Uuid,
        user_id: Option<Uuid>,
        window: Window,
    ) -> StoreResult<Slice<Attendee>> {
        let state = self.state.lock();

        let mut rows: Vec<AttendeeRow> = state
            .attendees
            .iter()
            .filter(|a| a.event_id == event_id)
            .filter(|a| user_id.map_or(true, |id| a.user_id == id))
            .filter_map(|a| state.attendee_row(a))
            .collect();
        rows.sort_by(|a, b| {
            (&a.first_name, &a.last_name, &a.username).cmp(&(&b.first_name, &b.last_name, &b.username))
        });

        Ok(Slice {
            total: rows.len() as u64,
            items: window.apply(rows.into_iter().map(Attendee::from)),
        })
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut state = self.state.lock();

        if !state.event_exists(comment.event_id) {
            return Err(StoreError::ForeignKeyViolation(
                "comments_event_id_fkey".to_string(),
            ));
        }
        let author_username = state
            .user(comment.author_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| StoreError::ForeignKeyViolation("comments_author_id_fkey".to_string()))?;

        let created = Comment {
            id: Uuid::new_v4(),
            event_id: comment.event_id,
            author_id: comment.author_id,
            author_username,
            content: comment.content,
            rating: comment.rating,
            created_at: Utc::now(),
        };
        state.comments.push(created.clone());

        Ok(created)
    }

    async fn list_comments(&self, event_id: Uuid, window: Window) -> StoreResult<Slice<Comment>> {
        let state = self.state.lock();

        // Newer rows were pushed later; reversing first keeps equal timestamps newest-first.
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .rev()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(Slice {
            total: comments.len() as u64,
            items: window.apply(comments),
        })
    }
}
