pub mod auth;
pub mod health;
pub mod posts;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::get_me))
        // Posts
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/latest", get(posts::latest_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/publish", post(posts::publish_post))
        .with_state(state)
}

/// Translate a domain failure into a response. Validation and not-found are
/// expected control flow; storage failures are logged in full and surfaced
/// opaquely.
pub(crate) fn error_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(fields) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Validation failed", "fields": fields })),
        )
            .into_response(),
        DomainError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not found" })),
        )
            .into_response(),
        DomainError::Database { operation, message } => {
            tracing::error!("Database failure during {}: {}", operation, message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
        DomainError::Construction(message) => {
            tracing::error!("Construction error reached a handler: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
