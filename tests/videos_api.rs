//! Router-level tests for the video endpoints, run against the in-memory store.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vidshare::{
    config::Config,
    error::{AppError, Result as AppResult},
    models::{
        user::User,
        video::{MutationOutcome, Video, VideoMutation, VideoQuery},
    },
    services::{
        database::{SeedData, UserStore, VideoStore},
        Database,
    },
    state::AppState,
};

struct TestApp {
    router: Router,
    state: Arc<AppState>,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::memory();
        db.seed(SeedData {
            users: vec![user("u1", "alice"), user("u2", "bob")],
            videos: vec![video("v1", "Rust ownership explained"), video("v2", "Cooking pasta")],
        })
        .await
        .unwrap();

        let config = Config {
            jwt_secret: "integration-secret".to_string(),
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config, db).unwrap());

        Self {
            router: vidshare::app(state.clone()),
            state,
        }
    }

    fn token(&self, user_id: &str) -> String {
        self.state.auth_service.issue_token(user_id).unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user_id)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn stored(&self, id: &str) -> Video {
        self.state.video_service.get_video(id).await.unwrap()
    }
}

fn user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
    }
}

fn video(id: &str, title: &str) -> Video {
    Video {
        id: id.to_string(),
        video_id: format!("yt-{}", id),
        title: title.to_string(),
        thumbnail_url: format!("https://cdn.example.com/{}.jpg", id),
        video_url: format!("https://cdn.example.com/{}.mp4", id),
        description: None,
        channel_id: "ch-1".to_string(),
        uploader: "u1".to_string(),
        views: 0,
        likes: Vec::new(),
        dislikes: Vec::new(),
        upload_date: Utc::now(),
        comments: Vec::new(),
    }
}

#[tokio::test]
async fn list_videos_supports_search() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/videos", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = app
        .send(Method::GET, "/api/videos?search=RUST&category=All", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let videos = body.as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["videoId"], "yt-v1");
    assert!(videos[0]["thumbnailURL"].is_string());
}

#[tokio::test]
async fn get_video_records_a_view() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/videos/v1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["views"], 1);

    let (_, body) = app.send(Method::GET, "/api/videos/v1", None, None).await;
    assert_eq!(body["views"], 2);
    assert_eq!(app.stored("v1").await.views, 2);
}

#[tokio::test]
async fn get_unknown_video_is_404() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/videos/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let (status, _) = app.send(Method::POST, "/api/videos/v1/like", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/videos/v1/like")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Well-formed token for a user that does not exist.
    let (status, _) = app
        .send(Method::POST, "/api/videos/v1/like", Some("ghost"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(app.stored("v1").await.likes.is_empty());
}

#[tokio::test]
async fn like_dislike_flow() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(Method::POST, "/api/videos/v1/like", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Video liked successfully");
    assert_eq!(app.stored("v1").await.likes, vec!["u1"]);

    let (status, body) = app
        .send(Method::POST, "/api/videos/v1/like", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ALREADY_LIKED");

    let (status, _) = app
        .send(Method::POST, "/api/videos/v1/dislike", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let stored = app.stored("v1").await;
    assert!(stored.likes.is_empty());
    assert_eq!(stored.dislikes, vec!["u1"]);

    let (status, _) = app
        .send(Method::POST, "/api/videos/v1/dislike", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stored("v1").await, stored);

    let (status, _) = app
        .send(Method::POST, "/api/videos/missing/dislike", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_lifecycle() {
    let app = TestApp::new().await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/videos/comment/v1",
            Some("u1"),
            Some(json!({ "text": "  great explanation " })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["text"], "great explanation");
    assert_eq!(created["userId"], "u1");
    let comment_id = created["commentId"].as_str().unwrap().to_string();
    let uri = format!("/api/videos/comment/v1/{}", comment_id);

    let (status, _) = app
        .send(Method::PUT, &uri, Some("u2"), Some(json!({ "text": "defaced" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.stored("v1").await.comments[0].text, "great explanation");

    let (status, edited) = app
        .send(Method::PUT, &uri, Some("u1"), Some(json!({ "text": "hello" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["text"], "hello");
    assert_eq!(edited["timestamp"], created["timestamp"]);

    let (status, _) = app.send(Method::DELETE, &uri, Some("u2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::DELETE, &uri, Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Comment deleted");
    assert!(app.stored("v1").await.comments.is_empty());

    let (status, _) = app.send(Method::DELETE, &uri, Some("u1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_comment_keeps_the_others_in_order() {
    let app = TestApp::new().await;

    let mut ids = Vec::new();
    for text in ["one", "two", "three"] {
        let (_, created) = app
            .send(
                Method::POST,
                "/api/videos/comment/v2",
                Some("u2"),
                Some(json!({ "text": text })),
            )
            .await;
        ids.push(created["commentId"].as_str().unwrap().to_string());
    }

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/videos/comment/v2/{}", ids[1]),
            Some("u2"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let texts: Vec<String> = app
        .stored("v2")
        .await
        .comments
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, vec!["one", "three"]);
}

#[tokio::test]
async fn blank_comment_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/videos/comment/v1",
            Some("u1"),
            Some(json!({ "text": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn comment_without_text_uses_error_envelope() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::POST, "/api/videos/comment/v1", Some("u1"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].is_string());
    assert!(app.stored("v1").await.comments.is_empty());
}

#[tokio::test]
async fn comment_with_non_json_body_uses_error_envelope() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/videos/comment/v1")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token("u1")))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("nice video"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/videos/comment/v1/whatever")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token("u1")))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comment_on_unknown_video_is_404() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/videos/comment/missing",
            Some("u1"),
            Some(json!({ "text": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_returns_the_authenticated_user() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/auth/me", Some("u2"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");

    let (status, _) = app.send(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_check_is_public() {
    let app = TestApp::new().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Store whose backend is never reachable.
struct UnreachableStore;

fn unreachable() -> AppError {
    AppError::internal("storage offline")
}

#[async_trait]
impl VideoStore for UnreachableStore {
    async fn list_videos(&self, _query: &VideoQuery) -> AppResult<Vec<Video>> {
        Err(unreachable())
    }

    async fn find_video(&self, _id: &str) -> AppResult<Option<Video>> {
        Err(unreachable())
    }

    async fn insert_video(&self, _video: Video) -> AppResult<Video> {
        Err(unreachable())
    }

    async fn mutate_video(
        &self,
        _id: &str,
        _mutation: &VideoMutation,
    ) -> AppResult<Option<(Video, MutationOutcome)>> {
        Err(unreachable())
    }

    async fn health_check(&self) -> AppResult<()> {
        Err(unreachable())
    }
}

#[async_trait]
impl UserStore for UnreachableStore {
    async fn find_user(&self, _id: &str) -> AppResult<Option<User>> {
        Err(unreachable())
    }

    async fn insert_user(&self, _user: User) -> AppResult<User> {
        Err(unreachable())
    }
}

#[tokio::test]
async fn health_check_reports_unavailable_storage() {
    let config = Config {
        jwt_secret: "integration-secret".to_string(),
        ..Config::default()
    };
    let db = Database::from_store(Arc::new(UnreachableStore));
    let state = Arc::new(AppState::new(config, db).unwrap());

    let response = vidshare::app(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "DATABASE_UNAVAILABLE");
}
