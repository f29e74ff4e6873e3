use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::policy::Owned;
use crate::utils::error::AppError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    #[serde(rename = "evento")]
    pub event_id: Uuid,
    #[serde(rename = "autor")]
    pub author_id: Uuid,
    #[serde(rename = "autor_username")]
    pub author_username: String,
    #[serde(rename = "contenido")]
    pub content: String,
    #[serde(rename = "puntuacion")]
    pub rating: Option<i16>,
    #[serde(rename = "creado_en")]
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /eventos/{id}/comentarios/crear`. `evento` and `autor` keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    #[serde(rename = "contenido")]
    pub content: String,
    #[serde(rename = "puntuacion", default)]
    pub rating: Option<i64>,
}

impl CreateComment {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.content.trim().is_empty() {
            return Err(AppError::ValidationError(
                "contenido may not be blank".to_string(),
            ));
        }

        if let Some(rating) = self.rating {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(AppError::ValidationError(format!(
                    "puntuacion must be between {} and {}",
                    MIN_RATING, MAX_RATING
                )));
            }
        }

        Ok(())
    }

    /// Call after [`CreateComment::validate`]; the rating is range-checked there.
    pub fn into_new_comment(self, event_id: Uuid, author_id: Uuid) -> NewComment {
        NewComment {
            event_id,
            author_id,
            content: self.content.trim().to_string(),
            rating: self.rating.and_then(|r| i16::try_from(r).ok()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub event_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub rating: Option<i16>,
}

impl Owned for NewComment {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}
