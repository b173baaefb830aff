use chrono::Utc;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Tag;

#[derive(Debug, Clone, FromRow)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub folder_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Note {
    pub fn new(title: String, content: Option<String>, folder_id: Option<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            folder_id,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Attach the resolved tag records for the response body.
    pub fn into_response(self, tags: Vec<Tag>) -> NoteResponse {
        NoteResponse {
            id: self.id,
            title: self.title,
            content: self.content,
            folder_id: self.folder_id,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// API shape of a note: tag references expanded to full tag records,
/// unset optionals omitted rather than rendered as null.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    pub tags: Vec<Tag>,
    pub created_at: String,
    pub updated_at: String,
}
