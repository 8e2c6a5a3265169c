use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh_token))
        .route("/auth/revoke", post(handlers::revoke_token))
        .route("/auth/me", get(handlers::get_current_user))
}

pub fn accounts() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::create_account))
        .route("/users/:id", get(handlers::get_account))
        .route("/users/:id", patch(handlers::update_profile))
        .route("/users/:id/timeline", get(handlers::user_timeline))
        .route(
            "/users/by-username/:username/timeline",
            get(handlers::user_timeline_by_username),
        )
        .route("/users/:id/follow", post(handlers::follow_account))
        .route("/users/:id/unfollow", post(handlers::unfollow_account))
        .route("/users/:id/followers", get(handlers::list_followers))
        .route("/users/:id/following", get(handlers::list_following))
        .route("/users/:id/relationship", get(handlers::relationship_status))
        .route("/account", delete(handlers::delete_account))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post))
        .route("/posts", get(handlers::list_posts))
        .route("/posts/:id", get(handlers::get_post))
        .route("/posts/:id", delete(handlers::delete_post))
}

pub fn timelines() -> Router<AppState> {
    Router::new()
        .route("/timeline/mine", get(handlers::my_timeline))
        .route("/timeline/home", get(handlers::home_timeline))
}
