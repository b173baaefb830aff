use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed identifier in a path segment, body field, or query param.
    /// Carries the field name for the message.
    InvalidId(&'static str),
    /// A `tags` array entry that does not parse as an identifier.
    InvalidTagId,
    /// Required body field missing or empty.
    MissingField(&'static str),
    /// Unique constraint hit on insert or update; carries the
    /// entity-specific message.
    Duplicate(&'static str),
    /// Rendered identically to the router fallback, so a miss on a
    /// well-formed id is indistinguishable from an unmatched route.
    NotFound,
    Database(sqlx::Error),
}

impl ApiError {
    /// Reclassify a unique-violation store error into `Duplicate`;
    /// anything else stays a store failure.
    pub fn duplicate_key(err: sqlx::Error, message: &'static str) -> Self {
        if err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            ApiError::Duplicate(message)
        } else {
            ApiError::Database(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidId(field) => (
                StatusCode::BAD_REQUEST,
                format!("The `{field}` is not valid"),
            ),
            ApiError::InvalidTagId => (
                StatusCode::BAD_REQUEST,
                "The `tags` array contains an invalid `id`".to_string(),
            ),
            ApiError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing `{field}` in request body"),
            ),
            ApiError::Duplicate(message) => (StatusCode::BAD_REQUEST, message.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            ApiError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Database(e)
    }
}
