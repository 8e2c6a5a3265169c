//! Post Tests
//!
//! Covers authoring, validation, retrieval, and deletion.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn create_post_returns_location() {
    let app = app().await;
    let user = app.create_user("post_create").await;

    let resp = app
        .post_json("/posts", json!({"body": "hello world"}), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    let body = resp.json();
    let id = body["id"].as_str().unwrap();
    assert_eq!(body["author_id"].as_str().unwrap(), user.id.to_string());
    assert_eq!(body["author_username"].as_str().unwrap(), user.username);
    assert_eq!(body["body"].as_str().unwrap(), "hello world");

    let location = resp
        .headers
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap();
    assert_eq!(location, format!("/posts/{}", id));
}

#[tokio::test]
async fn create_post_requires_auth() {
    let app = app().await;

    let resp = app.post_json("/posts", json!({"body": "anon"}), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_post_rejects_empty_body() {
    let app = app().await;
    let user = app.create_user("post_empty").await;

    let resp = app
        .post_json("/posts", json!({"body": "   "}), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.error_message(), "body cannot be empty");
}

#[tokio::test]
async fn create_post_rejects_oversized_body() {
    let app = app().await;
    let user = app.create_user("post_long").await;

    let body = "x".repeat(501);
    let resp = app
        .post_json("/posts", json!({"body": body}), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.error_message(), "body exceeds 500 characters");
}

#[tokio::test]
async fn get_post_roundtrip() {
    let app = app().await;
    let user = app.create_user("post_get").await;
    let post_id = app.create_post_for(user.id, "readable").await;

    let resp = app.get(&format!("/posts/{}", post_id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["body"].as_str().unwrap(), "readable");
}

#[tokio::test]
async fn get_unknown_post_is_not_found() {
    let app = app().await;

    let resp = app.get(&format!("/posts/{}", Uuid::new_v4()), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_posts_is_newest_first() {
    let app = app().await;
    let user = app.create_user("post_list").await;
    app.create_post_for(user.id, "older").await;
    app.create_post_for(user.id, "newer").await;

    let resp = app.get("/posts?limit=200", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    let bodies: Vec<&str> = items
        .iter()
        .filter(|item| item["author_id"].as_str().unwrap() == user.id.to_string())
        .map(|item| item["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["newer", "older"]);
}

#[tokio::test]
async fn delete_post() {
    let app = app().await;
    let user = app.create_user("post_delete").await;
    let post_id = app.create_post_for(user.id, "short lived").await;

    let resp = app
        .delete(&format!("/posts/{}", post_id), Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/posts/{}", post_id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_someone_elses_post_is_not_found() {
    let app = app().await;
    let author = app.create_user("post_del_author").await;
    let intruder = app.create_user("post_del_intruder").await;
    let post_id = app.create_post_for(author.id, "keep out").await;

    let resp = app
        .delete(&format!("/posts/{}", post_id), Some(&intruder.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    // still there
    let resp = app.get(&format!("/posts/{}", post_id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
}
