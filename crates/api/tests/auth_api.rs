//! HTTP-level integration tests for signup and login.

mod common;

use aistudio_api::auth::jwt::validate_token;
use axum::http::StatusCode;
use common::{body_json, post_json, test_config, SUCCESS_DRAW};
use serde_json::json;

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signup_returns_token_and_user() {
    let app = common::build_test_app(SUCCESS_DRAW).await;
    let body = json!({ "email": "user@example.com", "password": "SuperSecret1" });

    let response = post_json(app.router.clone(), "/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["token"].is_string());
    assert!(json["user"]["id"].is_number());
    assert_eq!(json["user"]["email"], "user@example.com");
    assert!(json["user"]["createdAt"].is_string());
    assert!(json["user"].get("passwordHash").is_none());

    let config = test_config(&app.uploads, &app.staging);
    let claims = validate_token(json["token"].as_str().unwrap(), &config.jwt).unwrap();
    assert_eq!(claims.sub, json["user"]["id"].as_i64().unwrap());
}

#[tokio::test]
async fn duplicate_signup_returns_409() {
    let app = common::build_test_app(SUCCESS_DRAW).await;
    let body = json!({ "email": "user@example.com", "password": "SuperSecret1" });

    let first = post_json(app.router.clone(), "/auth/signup", body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(app.router.clone(), "/auth/signup", body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert!(json["message"].as_str().unwrap().contains("already"));
}

#[tokio::test]
async fn signup_rejects_invalid_email_and_short_password() {
    let app = common::build_test_app(SUCCESS_DRAW).await;
    let body = json!({ "email": "not-an-email", "password": "short" });

    let response = post_json(app.router, "/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Validation error");
    assert!(json["issues"]["email"].is_array());
    assert!(json["issues"]["password"].is_array());
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_with_correct_password_returns_token() {
    let app = common::build_test_app(SUCCESS_DRAW).await;
    common::signup(app.router.clone(), "user@example.com").await;

    let body = json!({ "email": "user@example.com", "password": "SuperSecret1" });
    let response = post_json(app.router, "/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["token"].is_string());
    assert_eq!(json["user"]["email"], "user@example.com");
}

#[tokio::test]
async fn login_with_wrong_password_returns_401() {
    let app = common::build_test_app(SUCCESS_DRAW).await;
    common::signup(app.router.clone(), "user@example.com").await;

    let body = json!({ "email": "user@example.com", "password": "WrongPassword1" });
    let response = post_json(app.router, "/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid credentials");
}

#[tokio::test]
async fn login_with_unknown_email_returns_401() {
    let app = common::build_test_app(SUCCESS_DRAW).await;

    let body = json!({ "email": "nobody@example.com", "password": "SuperSecret1" });
    let response = post_json(app.router, "/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid credentials");
}
