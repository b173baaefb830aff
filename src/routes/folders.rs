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
use crate::models::Folder;
use crate::routes::notes::clear_folder_references;

#[derive(Deserialize)]
pub struct FolderPayload {
    name: Option<String>,
}

impl FolderPayload {
    fn require_name(self) -> Result<String, ApiError> {
        match self.name {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ApiError::MissingField("name")),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/folders", get(list_folders))
        .route("/folders", post(create_folder))
        .route("/folders/{id}", get(get_folder))
        .route("/folders/{id}", put(update_folder))
        .route("/folders/{id}", delete(delete_folder))
}

async fn list_folders(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let folders: Vec<Folder> = sqlx::query_as("SELECT * FROM folders ORDER BY name ASC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(folders))
}

async fn get_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    let folder: Option<Folder> = sqlx::query_as("SELECT * FROM folders WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;

    let Some(folder) = folder else {
        return Err(ApiError::NotFound);
    };

    Ok(Json(folder))
}

async fn create_folder(
    State(state): State<AppState>,
    Json(payload): Json<FolderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.require_name()?;

    let folder = Folder::new(name);

    sqlx::query("INSERT INTO folders (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(&folder.id)
        .bind(&folder.name)
        .bind(&folder.created_at)
        .bind(&folder.updated_at)
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::duplicate_key(e, "That folder already exists"))?;

    let location = format!("/api/folders/{}", folder.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(folder),
    ))
}

async fn update_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<FolderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    let name = payload.require_name()?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE folders SET name = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::duplicate_key(e, "That folder already exists"))?;

    let folder: Option<Folder> = sqlx::query_as("SELECT * FROM folders WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;

    let Some(folder) = folder else {
        return Err(ApiError::NotFound);
    };

    Ok(Json(folder))
}

async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidId("id"));
    }

    sqlx::query("DELETE FROM folders WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    // Detach the folder from any notes still pointing at it. Not atomic
    // with the delete above.
    clear_folder_references(&state.db, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
