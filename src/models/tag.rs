use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Lowercased sort key; keeps tag listings stable regardless of case.
    pub normalized: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Tag {
    pub fn new(name: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            normalized: Tag::normalize(&name),
            name,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn normalize(name: &str) -> String {
        name.to_lowercase()
    }
}
