use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::policy::Owned;
use crate::utils::error::AppError;

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fecha")]
    pub date: DateTime<Utc>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "organizador")]
    pub organizer_id: Uuid,
    #[serde(rename = "organizador_username")]
    pub organizer_username: String,
    #[serde(rename = "creado_en")]
    pub created_at: DateTime<Utc>,
}

impl Owned for Event {
    fn owner_id(&self) -> Uuid {
        self.organizer_id
    }
}

/// Body of `POST /eventos`. An `organizador` key in the body is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fecha", deserialize_with = "deserialize_date")]
    pub date: DateTime<Utc>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

impl CreateEvent {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)
    }

    pub fn into_new_event(self, organizer_id: Uuid) -> NewEvent {
        NewEvent {
            name: self.name.trim().to_string(),
            date: self.date,
            description: self.description.map(|d| d.trim().to_string()),
            organizer_id,
        }
    }
}

/// Body of `PATCH /eventos/{id}`. Only `nombre` and `fecha` are read; every other key is dropped.
/// Both may be omitted, but an explicit `null` is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    #[serde(rename = "nombre", default, deserialize_with = "deserialize_present")]
    pub name: Option<String>,
    #[serde(rename = "fecha", default, deserialize_with = "deserialize_present_date")]
    pub date: Option<DateTime<Utc>>,
}

impl EventPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        match &self.name {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            date: self.date,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.date.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub organizer_id: Uuid,
}

/// RFC 3339, or an ISO 8601 date-time without offset taken as UTC.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc()))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("'{}' is not a valid ISO 8601 date-time", raw))
    })
}

fn deserialize_present_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_date(deserializer).map(Some)
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError("nombre may not be blank".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::ValidationError(format!(
            "nombre must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}
