use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::api::error_response;
use crate::auth::Claims;
use crate::infrastructure::AppState;

#[utoipa::path(
    get,
    path = "/api/posts",
    params(
        ("title" = Option<String>, Query, description = "Substring filter on the title"),
        ("published" = Option<bool>, Query, description = "Filter on publication state"),
        ("page" = Option<u64>, Query, description = "Zero-based page index"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("sort" = Option<String>, Query, description = "Sort column, `-` prefix for descending")
    ),
    responses(
        (status = 200, description = "Page of the caller's posts"),
        (status = 400, description = "Invalid filter or pagination input")
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    let payload = Value::Object(
        params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    );
    match state.posts.list(&claims.caller(), payload).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/posts",
    responses(
        (status = 201, description = "Post created"),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    match state.posts.create(&claims.caller(), body).await {
        Ok(post) => (StatusCode::CREATED, Json(post)).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    responses(
        (status = 200, description = "The post"),
        (status = 404, description = "No such post for this caller")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.posts.get_by_id(&claims.caller(), id).await {
        Ok(post) => Json(post).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    responses(
        (status = 200, description = "The updated post"),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "No such post for this caller")
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> impl IntoResponse {
    match state.posts.update(&claims.caller(), id, patch).await {
        Ok(post) => Json(post).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    responses(
        (status = 200, description = "Post soft-deleted"),
        (status = 404, description = "No such post for this caller")
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.posts.delete(&claims.caller(), id).await {
        Ok(_) => Json(json!({ "message": "Post deleted successfully" })).into_response(),
        Err(e) => error_response(e),
    }
}

// Custom operations are invoked by name; the service decides how absence
// surfaces for each of them.

pub async fn latest_post(State(state): State<AppState>, claims: Claims) -> impl IntoResponse {
    match state.posts.call("latest", &claims.caller(), json!({})).await {
        Ok(post) => Json(post).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn publish_post(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state
        .posts
        .call("publish", &claims.caller(), json!({ "id": id }))
        .await
    {
        Ok(post) => Json(post).into_response(),
        Err(e) => error_response(e),
    }
}
