//! Auth Tests
//!
//! Login, token refresh rotation, revocation, and the uniform failure shape
//! for unknown accounts vs. wrong passwords.

mod common;

use axum::http::StatusCode;
use common::{app, DEFAULT_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn login_with_email_and_with_username() {
    let app = app().await;
    let user = app.create_user("auth_login").await;

    for identifier in [user.email.as_str(), user.username.as_str()] {
        let resp = app
            .post_json(
                "/auth/login",
                json!({"email": identifier, "password": DEFAULT_PASSWORD}),
                None,
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        let body = resp.json();
        assert!(body["access_token"].as_str().is_some());
        assert!(body["refresh_token"].as_str().is_some());
    }
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = app().await;
    let user = app.create_user("auth_uniform").await;

    // Wrong password and unknown identifier produce the same observable
    // failure; the handler must not distinguish them.
    let wrong_password = app
        .post_json(
            "/auth/login",
            json!({"email": user.email, "password": "not-the-password"}),
            None,
        )
        .await;
    let unknown_account = app
        .post_json(
            "/auth/login",
            json!({"email": "nobody@example.com", "password": "not-the-password"}),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_account.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.error_message(), unknown_account.error_message());
}

#[tokio::test]
async fn login_rejects_blank_fields() {
    let app = app().await;

    let resp = app
        .post_json("/auth/login", json!({"email": "", "password": ""}), None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_returns_the_authenticated_account() {
    let app = app().await;
    let user = app.create_user("auth_me").await;

    let resp = app.get("/auth/me", Some(&user.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["id"].as_str().unwrap(), user.id.to_string());

    let resp = app.get("/auth/me", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_the_refresh_token() {
    let app = app().await;
    let user = app.create_user("auth_refresh").await;

    let resp = app
        .post_json(
            "/auth/refresh",
            json!({"refresh_token": user.refresh_token}),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let rotated = resp.json()["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, user.refresh_token);

    // The old token is spent.
    let resp = app
        .post_json(
            "/auth/refresh",
            json!({"refresh_token": user.refresh_token}),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    // The rotated one works.
    let resp = app
        .post_json("/auth/refresh", json!({"refresh_token": rotated}), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn revoked_refresh_token_stops_working() {
    let app = app().await;
    let user = app.create_user("auth_revoke").await;

    let resp = app
        .post_json(
            "/auth/revoke",
            json!({"refresh_token": user.refresh_token}),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .post_json(
            "/auth/refresh",
            json!({"refresh_token": user.refresh_token}),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let app = app().await;
    let user = app.create_user("auth_mixup").await;

    let resp = app
        .post_json(
            "/auth/refresh",
            json!({"refresh_token": user.access_token}),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
