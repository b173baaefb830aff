pub mod cli;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use sqlx::SqlitePool;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
}

async fn health() -> &'static str {
    "ok"
}

/// Default response for unmatched routes. Single-entity lookups that miss
/// fall through to the same body (`ApiError::NotFound`).
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": "Not Found" })),
    )
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `pool`
/// beforehand.
pub fn build_app(pool: SqlitePool) -> Router {
    let state = AppState { db: pool };

    let api = Router::new()
        .merge(routes::folders::router())
        .merge(routes::tags::router())
        .merge(routes::notes::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
