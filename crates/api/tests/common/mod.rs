#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use aistudio_api::auth::jwt::JwtConfig;
use aistudio_api::config::ServerConfig;
use aistudio_api::router::build_app_router;
use aistudio_api::state::AppState;
use aistudio_core::clock::Sleeper;
use aistudio_core::simulator::{FixedRandom, GenerationSimulator};
use aistudio_db::DbPool;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

/// Random draw that always passes the overload check.
pub const SUCCESS_DRAW: f64 = 0.5;
/// Random draw that always trips the overload check.
pub const OVERLOAD_DRAW: f64 = 0.1;

/// Eight-byte PNG signature plus a little filler.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfiller";

const BOUNDARY: &str = "aistudio-test-boundary";

/// Completes every sleep immediately.
struct InstantSleeper;

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// A router over a fresh in-memory database and temporary directories.
///
/// The directories live as long as this struct.
pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub uploads: TempDir,
    pub staging: TempDir,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(uploads: &TempDir, staging: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "sqlite::memory:".to_string(),
        uploads_dir: uploads.path().to_path_buf(),
        staging_dir: staging.path().to_path_buf(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            expiry_mins: 60,
        },
    }
}

/// Build the full application router, forcing every simulated random draw
/// to `draw` and skipping the processing delay.
pub async fn build_test_app(draw: f64) -> TestApp {
    build_test_app_with_sleeper(draw, Arc::new(InstantSleeper)).await
}

/// Like [`build_test_app`], with the processing delay driven by `sleeper`.
pub async fn build_test_app_with_sleeper(draw: f64, sleeper: Arc<dyn Sleeper>) -> TestApp {
    let pool = aistudio_db::create_pool("sqlite::memory:").await.unwrap();
    aistudio_db::run_migrations(&pool).await.unwrap();

    let uploads = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    let config = test_config(&uploads, &staging);

    let simulator = GenerationSimulator::new(Arc::new(FixedRandom(draw)), sleeper);
    let state = AppState::with_simulator(pool.clone(), config.clone(), simulator);
    let router = build_app_router(state, &config);

    TestApp {
        router,
        pool,
        uploads,
        staging,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Encode `parts` as a `multipart/form-data` body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    token: Option<&str>,
    parts: &[Part<'_>],
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(multipart_body(parts))).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

/// Sign up `email` through the API and return the issued token.
pub async fn signup(app: Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": "SuperSecret1" });
    let response = post_json(app, "/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["token"].as_str().unwrap().to_string()
}

/// The standard valid generation form.
pub fn generation_form<'a>(prompt: &'a str, style: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::Text("prompt", prompt),
        Part::Text("style", style),
        Part::File {
            name: "image",
            filename: "summer look.png",
            content_type: "image/png",
            bytes: PNG_BYTES,
        },
    ]
}
