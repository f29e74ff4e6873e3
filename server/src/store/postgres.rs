use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    Attendee, AttendeeRow, Comment, Event, EventPatch, NewComment, NewEvent, NewUser, User,
    UserCredentials,
};
use crate::pagination::{Slice, Window};
use crate::store::{Store, StoreError, StoreResult};

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.first_name, u.last_name, u.created_at";

const EVENT_SELECT: &str = "SELECT e.id, e.name, e.date, e.description, e.organizer_id, \
     u.username AS organizer_username, e.created_at";

const ATTENDEE_SELECT: &str = "SELECT a.id, a.event_id, a.user_id, u.username, u.first_name, \
     u.last_name, a.registered_at";

const COMMENT_SELECT: &str = "SELECT c.id, c.event_id, c.author_id, u.username AS author_username, \
     c.content, c.rating, c.created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, first_name, last_name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users u WHERE u.id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {}, u.password_hash FROM users u WHERE u.username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn insert_token(&self, token: &str, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("INSERT INTO auth_tokens (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM auth_tokens t JOIN users u ON u.id = t.user_id WHERE t.token = $1",
            USER_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "{} FROM events e JOIN users u ON u.id = e.organizer_id ORDER BY e.created_at, e.id",
            EVENT_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event> {
        let created = sqlx::query_as::<_, Event>(&format!(
            r#"
            WITH e AS (
                INSERT INTO events (id, name, date, description, organizer_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            {} FROM e JOIN users u ON u.id = e.organizer_id
            "#,
            EVENT_SELECT
        ))
        .bind(Uuid::new_v4())
        .bind(&event.name)
        .bind(event.date)
        .bind(&event.description)
        .bind(event.organizer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "{} FROM events e JOIN users u ON u.id = e.organizer_id WHERE e.id = $1",
            EVENT_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn update_event(&self, id: Uuid, patch: &EventPatch) -> StoreResult<Option<Event>> {
        let updated = sqlx::query_as::<_, Event>(&format!(
            r#"
            WITH e AS (
                UPDATE events
                SET name = COALESCE($2, name),
                    date = COALESCE($3, date)
                WHERE id = $1
                RETURNING *
            )
            {} FROM e JOIN users u ON u.id = e.organizer_id
            "#,
            EVENT_SELECT
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(patch.date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn attendee_exists(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM attendees WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_attendee(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Attendee> {
        let row = sqlx::query_as::<_, AttendeeRow>(&format!(
            r#"
            WITH a AS (
                INSERT INTO attendees (id, event_id, user_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            {} FROM a JOIN users u ON u.id = a.user_id
            "#,
            ATTENDEE_SELECT
        ))
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_attendees(
        &self,
        event_id: Uuid,
        user_id: Option<Uuid>,
        window: Window,
    ) -> StoreResult<Slice<Attendee>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendees a \
             WHERE a.event_id = $1 AND ($2::uuid IS NULL OR a.user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, AttendeeRow>(&format!(
            r#"
            {} FROM attendees a JOIN users u ON u.id = a.user_id
            WHERE a.event_id = $1 AND ($2::uuid IS NULL OR a.user_id = $2)
            ORDER BY u.first_name, u.last_name, u.username, a.id
            LIMIT $3 OFFSET $4
            "#,
            ATTENDEE_SELECT
        ))
        .bind(event_id)
        .bind(user_id)
        .bind(to_i64(window.limit))
        .bind(to_i64(window.offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(Slice {
            items: rows.into_iter().map(Attendee::from).collect(),
            total: to_u64(total),
        })
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let created = sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH c AS (
                INSERT INTO comments (id, event_id, author_id, content, rating)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            {} FROM c JOIN users u ON u.id = c.author_id
            "#,
            COMMENT_SELECT
        ))
        .bind(Uuid::new_v4())
        .bind(comment.event_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.rating)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_comments(&self, event_id: Uuid, window: Window) -> StoreResult<Slice<Comment>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Comment>(&format!(
            r#"
            {} FROM comments c JOIN users u ON u.id = c.author_id
            WHERE c.event_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $2 OFFSET $3
            "#,
            COMMENT_SELECT
        ))
        .bind(event_id)
        .bind(to_i64(window.limit))
        .bind(to_i64(window.offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(Slice {
            items,
            total: to_u64(total),
        })
    }
}
