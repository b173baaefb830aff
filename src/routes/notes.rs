use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::models::{Note, Tag};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    title: Option<String>,
    content: Option<String>,
    folder_id: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListQuery {
    search_term: Option<String>,
    folder_id: Option<String>,
    tag_id: Option<String>,
}

struct ValidatedNote {
    title: String,
    content: Option<String>,
    folder_id: Option<String>,
    tags: Vec<String>,
}

/// Check the payload before anything touches the store: title present,
/// every reference well-formed. References are never checked for
/// existence, only format.
fn validate_note_payload(payload: NotePayload) -> Result<ValidatedNote, ApiError> {
    let Some(title) = payload.title.filter(|t| !t.is_empty()) else {
        return Err(ApiError::MissingField("title"));
    };

    // An empty string means "no folder", not a bad reference.
    let folder_id = payload.folder_id.filter(|f| !f.is_empty());
    if let Some(folder_id) = &folder_id {
        if Uuid::parse_str(folder_id).is_err() {
            return Err(ApiError::InvalidId("folderId"));
        }
    }

    let tags = payload.tags.unwrap_or_default();
    if tags.iter().any(|t| Uuid::parse_str(t).is_err()) {
        return Err(ApiError::InvalidTagId);
    }

    Ok(ValidatedNote {
        title,
        content: payload.content,
        folder_id,
        tags,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes))
        .route("/notes", post(create_note))
        .route("/notes/{id}", get(get_note))
        .route("/notes/{id}", put(update_note))
        .route("/notes/{id}", delete(delete_note))
}

/// Resolve a note's tag references to full tag records.
async fn fetch_note_tags(db: &SqlitePool, note_id: &str) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT t.* FROM tags t
        JOIN note_tags nt ON nt.tag_id = t.id
        WHERE nt.note_id = ?
        ORDER BY t.normalized ASC
        "#,
    )
    .bind(note_id)
    .fetch_all(db)
    .await
}

/// Replace a note's tag set wholesale.
async fn replace_note_tags(
    db: &SqlitePool,
    note_id: &str,
    tag_ids: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
        .bind(note_id)
        .execute(db)
        .await?;

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
            .bind(note_id)
            .bind(tag_id)
            .execute(db)
            .await?;
    }

    Ok(())
}

/// Unset `folderId` on every note referencing a deleted folder.
pub async fn clear_folder_references(db: &SqlitePool, folder_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE notes SET folder_id = NULL WHERE folder_id = ?")
        .bind(folder_id)
        .execute(db)
        .await?;

    Ok(())
}

/// Remove a deleted tag from every note's tag set, leaving other tags in
/// place.
pub async fn remove_tag_references(db: &SqlitePool, tag_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM note_tags WHERE tag_id = ?")
        .bind(tag_id)
        .execute(db)
        .await?;

    Ok(())
}

async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NoteListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(folder_id) = query.folder_id.as_deref() {
        if Uuid::parse_str(folder_id).is_err() {
            return Err(ApiError::InvalidId("folderId"));
        }
    }
    if let Some(tag_id) = query.tag_id.as_deref() {
        if Uuid::parse_str(tag_id).is_err() {
            return Err(ApiError::InvalidId("tagId"));
        }
    }

    // Filters are AND-combined; absent filters impose nothing.
    let mut sql = String::from("SELECT * FROM notes");
    let mut clauses: Vec<&str> = Vec::new();
    if query.search_term.is_some() {
        // instr, not LIKE: % and _ in the term stay literal
        clauses.push(
            "(instr(lower(title), lower(?)) > 0 OR instr(lower(coalesce(content, '')), lower(?)) > 0)",
        );
    }
    if query.folder_id.is_some() {
        clauses.push("folder_id = ?");
    }
    if query.tag_id.is_some() {
        clauses.push("id IN (SELECT note_id FROM note_tags WHERE tag_id = ?)");
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY updated_at DESC");

    let mut q = sqlx::query_as::<_, Note>(&sql);
    if let Some(term) = &query.search_term {
        q = q.bind(term).bind(term);
    }
    if let Some(folder_id) = &query.folder_id {
        q = q.bind(folder_id);
    }
    if let Some(tag_id) = &query.tag_id {
        q = q.bind(tag_id);
    }

    let notes = q.fetch_all(&state.db).await?;

    let mut results = Vec::with_capacity(notes.len());
    for note in notes {
        let tags = fetch_note_tags(&state.db, &note.id).await?;
        results.push(note.into_response(tags));
    }

    Ok(Json(results))
}

async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    let note: Option<Note> = sqlx::query_as("SELECT * FROM notes WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;

    let Some(note) = note else {
        return Err(ApiError::NotFound);
    };

    let tags = fetch_note_tags(&state.db, &note.id).await?;

    Ok(Json(note.into_response(tags)))
}

async fn create_note(
    State(state): State<AppState>,
    Json(payload): Json<NotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let valid = validate_note_payload(payload)?;

    let note = Note::new(valid.title, valid.content, valid.folder_id);

    sqlx::query(
        r#"
        INSERT INTO notes (id, title, content, folder_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&note.id)
    .bind(&note.title)
    .bind(&note.content)
    .bind(&note.folder_id)
    .bind(&note.created_at)
    .bind(&note.updated_at)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::duplicate_key(e, "A note with that title already exists"))?;

    for tag_id in &valid.tags {
        sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
            .bind(&note.id)
            .bind(tag_id)
            .execute(&state.db)
            .await?;
    }

    let tags = fetch_note_tags(&state.db, &note.id).await?;

    let location = format!("/api/notes/{}", note.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(note.into_response(tags)),
    ))
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<NotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    let valid = validate_note_payload(payload)?;
    let now = chrono::Utc::now().to_rfc3339();

    // Full replace: title, content, folderId, and the tag set all take the
    // payload's values, set or not.
    let result = sqlx::query(
        "UPDATE notes SET title = ?, content = ?, folder_id = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&valid.title)
    .bind(&valid.content)
    .bind(&valid.folder_id)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::duplicate_key(e, "A note with that title already exists"))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }

    replace_note_tags(&state.db, &id, &valid.tags).await?;

    let note: Note = sqlx::query_as("SELECT * FROM notes WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    let tags = fetch_note_tags(&state.db, &note.id).await?;

    Ok(Json(note.into_response(tags)))
}

async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
