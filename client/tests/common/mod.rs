//! Common Test Utilities for Integration Tests
//!
//! An in-process fake of the MiniStream API served over real HTTP, plus
//! helpers for building clients against it.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use ministream_client::config::ApiConfig;
use ministream_client::{ApiClient, MemoryStorage, TokenStore};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const TEST_EMAIL: &str = "a@b.com";
pub const TEST_PASSWORD: &str = "validpass1";
pub const KNOWN_VIDEO_ID: i64 = 7;
pub const GOOGLE_ID_TOKEN: &str = "google-id-token";
pub const MERGE_FAILURE_DETAIL: &str = "Merge failed. Make sure all clips are valid MP4/WebM files.";

/// Shared state of the fake API, inspectable from tests
#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<FakeInner>,
}

#[derive(Default)]
struct FakeInner {
    next_token: AtomicUsize,
    access_tokens: Mutex<HashSet<String>>,
    refresh_tokens: Mutex<HashSet<String>>,
    is_creator: AtomicBool,
    display_name: Mutex<Option<String>>,
    refresh_calls: AtomicUsize,
    merge_calls: AtomicUsize,
    merged_files: Mutex<Vec<Vec<String>>>,
    published: Mutex<Vec<Value>>,
    history_cleared: AtomicBool,
    me_calls: AtomicUsize,
    refresh_delay_ms: AtomicU64,
    me_delay_ms: AtomicU64,
}

impl FakeApi {
    /// Mint a token pair the fake accepts
    pub fn issue_token_pair(&self) -> (String, String) {
        let n = self.inner.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        self.inner.access_tokens.lock().unwrap().insert(access.clone());
        self.inner.refresh_tokens.lock().unwrap().insert(refresh.clone());
        (access, refresh)
    }

    fn issue_access_token(&self) -> String {
        let n = self.inner.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        self.inner.access_tokens.lock().unwrap().insert(access.clone());
        access
    }

    /// Every access token issued so far now answers 401
    pub fn expire_access_tokens(&self) {
        self.inner.access_tokens.lock().unwrap().clear();
    }

    /// Every refresh token issued so far is rejected
    pub fn revoke_refresh_tokens(&self) {
        self.inner.refresh_tokens.lock().unwrap().clear();
    }

    pub fn is_valid_access_token(&self, token: &str) -> bool {
        self.inner.access_tokens.lock().unwrap().contains(token)
    }

    pub fn set_creator(&self, is_creator: bool) {
        self.inner.is_creator.store(is_creator, Ordering::SeqCst);
    }

    /// Hold every `/auth/refresh` response for `delay`
    pub fn set_refresh_delay(&self, delay: Duration) {
        self.inner
            .refresh_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Hold every authorized `/auth/me` response for `delay`
    pub fn set_me_delay(&self, delay: Duration) {
        self.inner
            .me_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    /// Authorized `/auth/me` calls received, counted before any delay
    pub fn me_calls(&self) -> usize {
        self.inner.me_calls.load(Ordering::SeqCst)
    }

    pub fn merge_calls(&self) -> usize {
        self.inner.merge_calls.load(Ordering::SeqCst)
    }

    /// File names received by each merge call, in upload order
    pub fn merged_files(&self) -> Vec<Vec<String>> {
        self.inner.merged_files.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<Value> {
        self.inner.published.lock().unwrap().clone()
    }

    pub fn history_cleared(&self) -> bool {
        self.inner.history_cleared.load(Ordering::SeqCst)
    }

    fn user_json(&self) -> Value {
        let display_name = self
            .inner
            .display_name
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "Aki".to_string());
        json!({
            "id": 1,
            "email": TEST_EMAIL,
            "display_name": display_name,
            "avatar_url": null,
            "bio": null,
            "is_creator": self.inner.is_creator.load(Ordering::SeqCst),
            "created_at": "2024-05-01T09:30:00.123456",
        })
    }

    /// Flask-JWT style bearer check
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let Some(token) = bearer(headers) else {
            return Err(failure(
                StatusCode::UNAUTHORIZED,
                json!({"msg": "Missing Authorization Header"}),
            ));
        };
        if !token.starts_with("access-") {
            return Err(failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({"msg": "Not enough segments"}),
            ));
        }
        if !self.is_valid_access_token(&token) {
            return Err(failure(
                StatusCode::UNAUTHORIZED,
                json!({"msg": "Token has expired"}),
            ));
        }
        Ok(())
    }

    fn require_creator(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.authorize(headers)?;
        if !self.inner.is_creator.load(Ordering::SeqCst) {
            return Err(failure(
                StatusCode::FORBIDDEN,
                json!({"error": "Creator account required"}),
            ));
        }
        Ok(())
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn failure(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

async fn pause(delay_ms: &AtomicU64) {
    let ms = delay_ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

pub fn video_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "creator_id": 1,
        "creator_name": "Aki",
        "series_id": null,
        "series_title": null,
        "title": title,
        "description": "A test video",
        "genre": "Anime",
        "language": "English",
        "video_url": format!("https://cdn.test/videos/{id}.mp4"),
        "thumbnail_url": null,
        "duration": 95,
        "duration_formatted": "1:35",
        "episode_number": null,
        "season_number": null,
        "view_count": 3,
        "is_published": true,
        "created_at": "2024-05-01T09:30:00",
    })
}

async fn login(State(fake): State<FakeApi>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().trim().to_lowercase();
    let password = body["password"].as_str().unwrap_or_default();
    if email != TEST_EMAIL || password != TEST_PASSWORD {
        return failure(StatusCode::UNAUTHORIZED, json!({"error": "Invalid credentials"}));
    }

    let (access, refresh) = fake.issue_token_pair();
    Json(json!({
        "user": fake.user_json(),
        "access_token": access,
        "refresh_token": refresh,
    }))
    .into_response()
}

async fn signup(State(fake): State<FakeApi>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().trim().to_lowercase();
    let password = body["password"].as_str().unwrap_or_default();
    let display_name = body["display_name"].as_str().unwrap_or_default();

    if email == TEST_EMAIL {
        return failure(StatusCode::CONFLICT, json!({"error": "Email already registered"}));
    }
    if password.len() < 8 {
        return failure(
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Invalid signup",
                "errors": {"password": "Password must be at least 8 characters"},
            }),
        );
    }

    let (access, refresh) = fake.issue_token_pair();
    (
        StatusCode::CREATED,
        Json(json!({
            "user": {
                "id": 2,
                "email": email,
                "display_name": display_name,
                "is_creator": false,
                "created_at": "2024-06-01T12:00:00",
            },
            "access_token": access,
            "refresh_token": refresh,
        })),
    )
        .into_response()
}

async fn google_login(State(fake): State<FakeApi>, Json(body): Json<Value>) -> Response {
    if body["token"].as_str() != Some(GOOGLE_ID_TOKEN) {
        return failure(StatusCode::UNAUTHORIZED, json!({"error": "Invalid Google token"}));
    }
    let (access, refresh) = fake.issue_token_pair();
    Json(json!({
        "user": fake.user_json(),
        "access_token": access,
        "refresh_token": refresh,
    }))
    .into_response()
}

async fn refresh(State(fake): State<FakeApi>, headers: HeaderMap) -> Response {
    fake.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
    pause(&fake.inner.refresh_delay_ms).await;
    let valid = bearer(&headers)
        .is_some_and(|t| fake.inner.refresh_tokens.lock().unwrap().contains(&t));
    if !valid {
        return failure(StatusCode::UNAUTHORIZED, json!({"msg": "Token has been revoked"}));
    }
    Json(json!({"access_token": fake.issue_access_token()})).into_response()
}

async fn me(State(fake): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = fake.authorize(&headers) {
        return response;
    }
    fake.inner.me_calls.fetch_add(1, Ordering::SeqCst);
    // The profile as of the request, even if it changes during the delay
    let user = fake.user_json();
    pause(&fake.inner.me_delay_ms).await;
    Json(json!({ "user": user })).into_response()
}

async fn become_creator(State(fake): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = fake.authorize(&headers) {
        return response;
    }
    fake.set_creator(true);
    Json(json!({"user": fake.user_json()})).into_response()
}

async fn update_profile(
    State(fake): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = fake.authorize(&headers) {
        return response;
    }
    if let Some(name) = body["display_name"].as_str() {
        if name.chars().count() > 30 {
            return failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "Invalid profile",
                    "errors": {"display_name": ["Display name is too long"]},
                }),
            );
        }
        *fake.inner.display_name.lock().unwrap() = Some(name.to_string());
    }
    Json(json!({"user": fake.user_json()})).into_response()
}

async fn get_video(
    State(fake): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = fake.authorize(&headers) {
        return response;
    }
    if id != KNOWN_VIDEO_ID {
        return failure(StatusCode::NOT_FOUND, json!({"error": "Video not found"}));
    }
    Json(json!({"video": video_json(id, "Night Drive")})).into_response()
}

async fn search() -> Response {
    Json(json!({
        "videos": [video_json(KNOWN_VIDEO_ID, "Night Drive")],
        "series": [],
    }))
    .into_response()
}

async fn clear_history(State(fake): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = fake.authorize(&headers) {
        return response;
    }
    fake.inner.history_cleared.store(true, Ordering::SeqCst);
    Json(json!({"message": "History cleared"})).into_response()
}

async fn merge(State(fake): State<FakeApi>, headers: HeaderMap, mut form: Multipart) -> Response {
    if let Err(response) = fake.require_creator(&headers) {
        return response;
    }

    let mut files = Vec::new();
    while let Ok(Some(field)) = form.next_field().await {
        let is_clip = field.name() == Some("clips");
        let file_name = field.file_name().unwrap_or_default().to_string();
        if field.bytes().await.is_err() {
            return failure(StatusCode::BAD_REQUEST, json!({"error": "Malformed upload"}));
        }
        if is_clip {
            files.push(file_name);
        }
    }

    fake.inner.merge_calls.fetch_add(1, Ordering::SeqCst);
    fake.inner.merged_files.lock().unwrap().push(files.clone());

    if files.len() < 2 {
        return failure(
            StatusCode::BAD_REQUEST,
            json!({"error": "Upload at least 2 clips to merge."}),
        );
    }
    if files.iter().any(|f| f.ends_with(".txt")) {
        return failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": MERGE_FAILURE_DETAIL}),
        );
    }

    Json(json!({
        "video_url": "https://cdn.test/merged/1.mp4",
        "duration": 10 * files.len(),
        "clip_count": files.len(),
    }))
    .into_response()
}

async fn publish(
    State(fake): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = fake.require_creator(&headers) {
        return response;
    }
    for field in ["title", "description", "genre", "language", "video_url"] {
        if body[field].as_str().is_none_or(str::is_empty) {
            return failure(
                StatusCode::BAD_REQUEST,
                json!({"error": format!("{field} is required")}),
            );
        }
    }

    let title = body["title"].as_str().unwrap_or_default().to_string();
    fake.inner.published.lock().unwrap().push(body);
    (
        StatusCode::CREATED,
        Json(json!({"video": video_json(42, &title)})),
    )
        .into_response()
}

/// Create the fake API router
pub fn create_fake_api() -> (Router, FakeApi) {
    let fake = FakeApi::default();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/google", post(google_login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/auth/become-creator", post(become_creator))
        .route("/auth/profile", put(update_profile))
        .route("/videos/:id", get(get_video))
        .route("/discover/search", get(search))
        .route("/discover/history", delete(clear_history))
        .route("/studio/merge", post(merge))
        .route("/studio/publish", post(publish))
        .with_state(fake.clone());

    let app = Router::new().nest("/api", api).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    (app, fake)
}

/// Serve the fake API on an ephemeral port; returns its base URL
pub async fn spawn_fake_api() -> (String, FakeApi) {
    let (app, fake) = create_fake_api();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), fake)
}

/// Client over fresh in-memory storage, with the storage kept for inspection
pub fn client_for(base_url: &str) -> (Arc<ApiClient>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let tokens = TokenStore::new(storage.clone());
    let api = ApiClient::new(&ApiConfig::with_base_url(base_url), tokens).unwrap();
    (Arc::new(api), storage)
}

/// Poll `condition` until it holds; panics after two seconds
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Timed out waiting for the fake API"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Initialize test logging for detailed output
pub fn init_test_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ministream_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
