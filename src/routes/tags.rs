use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::models::Tag;
use crate::routes::notes::remove_tag_references;

#[derive(Deserialize)]
pub struct TagPayload {
    name: Option<String>,
}

impl TagPayload {
    fn require_name(self) -> Result<String, ApiError> {
        match self.name {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ApiError::MissingField("name")),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags", post(create_tag))
        .route("/tags/{id}", get(get_tag))
        .route("/tags/{id}", put(update_tag))
        .route("/tags/{id}", delete(delete_tag))
}

async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    // Sorted on the lowercased key so casing never reorders the list.
    let tags: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY normalized ASC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(tags))
}

async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;

    let Some(tag) = tag else {
        return Err(ApiError::NotFound);
    };

    Ok(Json(tag))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<TagPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.require_name()?;

    let tag = Tag::new(name);

    sqlx::query(
        "INSERT INTO tags (id, name, normalized, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&tag.id)
    .bind(&tag.name)
    .bind(&tag.normalized)
    .bind(&tag.created_at)
    .bind(&tag.updated_at)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::duplicate_key(e, "That tag already exists"))?;

    let location = format!("/api/tags/{}", tag.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(tag)))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<TagPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    let name = payload.require_name()?;
    let normalized = Tag::normalize(&name);
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE tags SET name = ?, normalized = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&normalized)
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::duplicate_key(e, "That tag already exists"))?;

    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;

    let Some(tag) = tag else {
        return Err(ApiError::NotFound);
    };

    Ok(Json(tag))
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    // Drop the tag from every note's tag set. Not atomic with the
    // delete above.
    remove_tag_references(&state.db, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
