use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{AError, AResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub is_completed: bool,
    pub tags: Option<String>, // e.g. "groceries,weekend"
    pub user_id: Option<i64>,
    pub created_at: String, // RFC 3339, e.g. "2024-03-01T12:30:00Z"
    pub updated_at: String,
}

/// Request body for both create and update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NoteFC {
    pub content: String,

    #[serde(default)]
    pub is_completed: bool,

    #[serde(default)]
    pub tags: Option<String>,
}

impl NoteFC {
    pub fn validate(&self) -> AResult<()> {
        if self.content.trim().is_empty() {
            return Err(AError::validation("content cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteDeleted {
    pub message: String,
    pub id: i64,
}

impl NoteDeleted {
    pub fn new(id: i64) -> Self {
        Self {
            message: "Note deleted successfully".to_string(),
            id,
        }
    }
}
