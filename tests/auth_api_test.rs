use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use inkpost::infrastructure::AppState;
use inkpost::{api, db};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

async fn setup_app() -> Router {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let state = AppState::new(db).expect("Failed to compose services");
    api::api_router(state)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_register_login_me_roundtrip() {
    let app = setup_app().await;

    let (status, body) = post_json(
        app.clone(),
        "/auth/register",
        json!({ "username": "alice", "password": "hunter2!" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], json!("alice"));

    // Same username again is a conflict
    let (status, _) = post_json(
        app.clone(),
        "/auth/register",
        json!({ "username": "alice", "password": "other" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Wrong password is rejected without detail
    let (status, body) = post_json(
        app.clone(),
        "/auth/login",
        json!({ "username": "alice", "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Invalid credentials"));

    let (status, body) = post_json(
        app.clone(),
        "/auth/login",
        json!({ "username": "alice", "password": "hunter2!" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token issued").to_owned();

    let request = Request::builder()
        .method("GET")
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let me: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(me["username"], json!("alice"));
    assert!(me["user_id"].is_i64());
    // Each login mints a session id the repositories scope by
    assert!(me["session_id"].as_str().is_some_and(|sid| !sid.is_empty()));
}

#[tokio::test]
async fn test_me_requires_a_token() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/auth/me")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_requires_credentials() {
    let app = setup_app().await;

    let (status, _) = post_json(
        app.clone(),
        "/auth/register",
        json!({ "username": "", "password": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        app,
        "/auth/register",
        json!({ "username": "carol", "password": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
