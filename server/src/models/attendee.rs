use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::display_name;
use crate::policy::Owned;

/// Registration of one user for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub id: Uuid,
    #[serde(rename = "evento")]
    pub event_id: Uuid,
    #[serde(rename = "usuario")]
    pub user_id: Uuid,
    #[serde(rename = "nombre_completo")]
    pub full_name: String,
    #[serde(rename = "fecha_registro")]
    pub registered_at: DateTime<Utc>,
}

/// A registration about to be written. The registered user owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAttendee {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

impl Owned for NewAttendee {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Attendee joined with its user, as read from storage.
#[derive(Debug, Clone, FromRow)]
pub struct AttendeeRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub registered_at: DateTime<Utc>,
}

impl From<AttendeeRow> for Attendee {
    fn from(row: AttendeeRow) -> Self {
        Self {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            full_name: display_name(&row.first_name, &row.last_name, &row.username),
            registered_at: row.registered_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendeeFilter {
    #[serde(rename = "usuario", default)]
    pub user: Option<String>,
}

impl AttendeeFilter {
    /// Blank `usuario` means no filter; anything else must be a user id.
    pub fn user_id(&self) -> Result<Option<Uuid>, uuid::Error> {
        match self.user.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Uuid::parse_str(raw).map(Some),
        }
    }
}
