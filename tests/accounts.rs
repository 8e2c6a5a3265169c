//! Account Tests
//!
//! Registration, lookup, profile updates, and deletion cascades.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn register_account() {
    let app = app().await;

    let resp = app
        .post_json(
            "/users",
            json!({
                "username": "acct_register",
                "email": "acct_register@example.com",
                "display_name": "Fresh Account",
                "password": "longenoughpw",
            }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["username"].as_str().unwrap(), "acct_register");
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn register_rejects_bad_fields() {
    let app = app().await;

    let resp = app
        .post_json(
            "/users",
            json!({
                "username": "has spaces",
                "email": "a@b.c",
                "display_name": "X",
                "password": "longenoughpw",
            }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .post_json(
            "/users",
            json!({
                "username": "acct_shortpw",
                "email": "a@b.c",
                "display_name": "X",
                "password": "short",
            }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let app = app().await;
    let existing = app.create_user("acct_dup").await;

    let resp = app
        .post_json(
            "/users",
            json!({
                "username": existing.username,
                "email": "acct_dup_other@example.com",
                "display_name": "Copycat",
                "password": "longenoughpw",
            }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.error_message(), "username already taken");
}

#[tokio::test]
async fn get_account_is_public_projection() {
    let app = app().await;
    let user = app.create_user("acct_get").await;

    let resp = app.get(&format!("/users/{}", user.id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["username"].as_str().unwrap(), user.username);
    assert!(body.get("email").is_none());
}

#[tokio::test]
async fn get_unknown_account_is_not_found() {
    let app = app().await;

    let resp = app.get(&format!("/users/{}", Uuid::new_v4()), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_own_profile() {
    let app = app().await;
    let user = app.create_user("acct_update").await;

    let resp = app
        .patch_json(
            &format!("/users/{}", user.id),
            json!({"display_name": "Renamed", "bio": "new bio"}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["display_name"].as_str().unwrap(), "Renamed");
    assert_eq!(body["bio"].as_str().unwrap(), "new bio");
}

#[tokio::test]
async fn update_other_profile_is_forbidden() {
    let app = app().await;
    let user = app.create_user("acct_upd_self").await;
    let other = app.create_user("acct_upd_other").await;

    let resp = app
        .patch_json(
            &format!("/users/{}", other.id),
            json!({"display_name": "Hijacked"}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_account_cascades_to_posts_and_edges() {
    let app = app().await;
    let user = app.create_user("acct_del").await;
    let follower = app.create_user("acct_del_follower").await;

    let post_id = app.create_post_for(user.id, "soon gone").await;
    app.post_json(
        &format!("/users/{}/follow", user.id),
        json!({}),
        Some(&follower.access_token),
    )
    .await;

    let resp = app.delete("/account", Some(&user.access_token)).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/posts/{}", post_id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let edges: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followed_id = $1")
        .bind(user.id)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(edges, 0);

    // A timeline for the deleted account is now a 404, not an empty list.
    let resp = app.get(&format!("/users/{}/timeline", user.id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
