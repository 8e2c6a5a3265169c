use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::accounts::AccountService;
use crate::app::auth::AuthService;
use crate::app::posts::PostService;
use crate::app::relationships::RelationshipService;
use crate::app::timeline::TimelineService;
use crate::domain::post::Post;
use crate::domain::relationship::{Relationship, RelationshipStatus};
use crate::domain::validate;
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

fn parse_cursor(cursor: Option<String>) -> Result<Option<(OffsetDateTime, Uuid)>, AppError> {
    let Some(cursor) = cursor else {
        return Ok(None);
    };

    let mut parts = cursor.splitn(2, '/');
    let timestamp = parts
        .next()
        .ok_or_else(|| AppError::bad_request("invalid cursor"))?;
    let id = parts
        .next()
        .ok_or_else(|| AppError::bad_request("invalid cursor"))?;

    let timestamp = OffsetDateTime::parse(timestamp, &Rfc3339)
        .map_err(|_| AppError::bad_request("invalid cursor"))?;
    let id = Uuid::parse_str(id).map_err(|_| AppError::bad_request("invalid cursor"))?;

    Ok(Some((timestamp, id)))
}

fn encode_cursor(cursor: Option<(OffsetDateTime, Uuid)>) -> Option<String> {
    let (timestamp, id) = cursor?;
    let timestamp = timestamp.format(&Rfc3339).ok()?;
    Some(format!("{}/{}", timestamp, id))
}

fn parse_limit(limit: Option<i64>) -> Result<i64, AppError> {
    let limit = limit.unwrap_or(30);
    if !(1..=200).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 200"));
    }
    Ok(limit)
}

/// Trim a limit+1 page down to the page size and derive the next cursor
/// from the extra row, if any.
fn paginate<T>(
    mut items: Vec<T>,
    limit: i64,
    cursor_of: impl Fn(&T) -> (OffsetDateTime, Uuid),
) -> (Vec<T>, Option<(OffsetDateTime, Uuid)>) {
    let next_cursor = if items.len() > limit as usize {
        items.pop();
        items.last().map(&cursor_of)
    } else {
        None
    };
    (items, next_cursor)
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_expires_at: OffsetDateTime,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.paseto_refresh_key,
        state.access_ttl_minutes,
        state.refresh_ttl_days,
    )
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    if payload.email.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }
    if payload.password.len() > validate::MAX_PASSWORD_CHARS {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let tokens = auth_service(&state)
        .login(&payload.email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match tokens {
        Some(tokens) => Ok(Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        })),
        None => Err(AppError::unauthorized("invalid credentials")),
    }
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    let tokens = auth_service(&state)
        .refresh(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to refresh token");
            AppError::internal("failed to refresh token")
        })?;

    match tokens {
        Some(tokens) => Ok(Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        })),
        None => Err(AppError::unauthorized("invalid refresh token")),
    }
}

#[derive(Deserialize)]
pub struct RevokeRequest {
    pub refresh_token: String,
}

pub async fn revoke_token(
    State(state): State<AppState>,
    Json(payload): Json<RevokeRequest>,
) -> Result<StatusCode, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    auth_service(&state)
        .revoke_refresh_token(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to revoke token");
            AppError::internal("failed to revoke token")
        })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<crate::domain::account::Account>, AppError> {
    let service = AccountService::new(state.db.clone());
    let account = service.resolve(auth.user_id).await?;
    Ok(Json(account))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub password: String,
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Json<crate::domain::account::Account>, AppError> {
    validate::validate_new_account(
        &payload.username,
        &payload.email,
        &payload.display_name,
        &payload.password,
    )?;

    let account = auth_service(&state)
        .signup(
            payload.username,
            payload.email,
            payload.display_name,
            payload.bio,
            payload.password,
        )
        .await
        .map_err(|err| {
            if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
                if let Some(db_err) = sqlx_err.as_database_error() {
                    if db_err.code().as_deref() == Some("23505") {
                        let constraint = db_err.constraint().unwrap_or_default();
                        if constraint.contains("users_username_key") {
                            return AppError::conflict("username already taken");
                        }
                        if constraint.contains("users_email_key") {
                            return AppError::conflict("email already taken");
                        }
                    }
                }
            }
            tracing::error!(error = ?err, "failed to create account");
            AppError::internal("failed to create account")
        })?;

    Ok(Json(account))
}

pub async fn get_account(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<crate::domain::account::PublicAccount>, AppError> {
    let service = AccountService::new(state.db.clone());
    let account = service.resolve(id).await?;
    Ok(Json(account.into()))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

pub async fn update_profile(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<crate::domain::account::Account>, AppError> {
    if auth.user_id != id {
        return Err(AppError::forbidden("cannot update other accounts"));
    }

    if let Some(display_name) = &payload.display_name {
        if display_name.trim().is_empty() {
            return Err(AppError::unprocessable_entity("display_name cannot be empty"));
        }
    }

    let service = AccountService::new(state.db.clone());
    let account = service
        .update_profile(id, payload.display_name, payload.bio)
        .await?;

    match account {
        Some(account) => Ok(Json(account)),
        None => Err(AppError::not_found("account not found")),
    }
}

pub async fn delete_account(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = AccountService::new(state.db.clone());
    let deleted = service.delete_account(auth.user_id).await?;

    if deleted {
        tracing::info!(user_id = %auth.user_id, "account deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("account not found"))
    }
}

// ---------------------------------------------------------------------------
// Follow graph
// ---------------------------------------------------------------------------

pub async fn follow_account(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Relationship>), AppError> {
    let service = RelationshipService::new(state.db.clone());
    let relationship = service.follow(auth.user_id, id).await?;

    tracing::debug!(follower_id = %auth.user_id, followed_id = %id, "follow created");
    Ok((StatusCode::CREATED, Json(relationship)))
}

pub async fn unfollow_account(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = RelationshipService::new(state.db.clone());
    let relationship = service.get_relationship(auth.user_id, id).await?;
    service.unfollow(&relationship).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct FollowEdgeItem {
    pub account: crate::domain::account::PublicAccount,
    #[serde(with = "time::serde::rfc3339")]
    pub followed_at: OffsetDateTime,
}

pub async fn list_followers(
    Path(id): Path<Uuid>,
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<FollowEdgeItem>>, AppError> {
    let limit = parse_limit(query.limit)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = RelationshipService::new(state.db.clone());
    let edges = service.list_followers(id, cursor, limit + 1).await?;

    let (edges, next_cursor) = paginate(edges, limit, |edge| (edge.followed_at, edge.account.id));
    let items = edges
        .into_iter()
        .map(|edge| FollowEdgeItem {
            account: edge.account,
            followed_at: edge.followed_at,
        })
        .collect();

    Ok(Json(ListResponse {
        items,
        next_cursor: encode_cursor(next_cursor),
    }))
}

pub async fn list_following(
    Path(id): Path<Uuid>,
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<FollowEdgeItem>>, AppError> {
    let limit = parse_limit(query.limit)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = RelationshipService::new(state.db.clone());
    let edges = service.list_following(id, cursor, limit + 1).await?;

    let (edges, next_cursor) = paginate(edges, limit, |edge| (edge.followed_at, edge.account.id));
    let items = edges
        .into_iter()
        .map(|edge| FollowEdgeItem {
            account: edge.account,
            followed_at: edge.followed_at,
        })
        .collect();

    Ok(Json(ListResponse {
        items,
        next_cursor: encode_cursor(next_cursor),
    }))
}

pub async fn relationship_status(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<RelationshipStatus>, AppError> {
    let service = RelationshipService::new(state.db.clone());
    let status = service.relationship_status(auth.user_id, id).await?;
    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Post>), AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.create_post(auth.user_id, payload.body).await?;

    let location = format!("/posts/{}", post.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(post),
    ))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let limit = parse_limit(query.limit)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = PostService::new(state.db.clone());
    let posts = service.list_posts(cursor, limit + 1).await?;
    Ok(post_page(posts, limit))
}

pub async fn get_post(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Post>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_post(id).await?;

    match post {
        Some(post) => Ok(Json(post)),
        None => Err(AppError::not_found("post not found")),
    }
}

pub async fn delete_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = PostService::new(state.db.clone());
    let deleted = service.delete_post(id, auth.user_id).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("post not found"))
    }
}

// ---------------------------------------------------------------------------
// Timelines
// ---------------------------------------------------------------------------

fn post_page(posts: Vec<Post>, limit: i64) -> Json<ListResponse<Post>> {
    let (items, next_cursor) = paginate(posts, limit, |post| (post.created_at, post.id));
    Json(ListResponse {
        items,
        next_cursor: encode_cursor(next_cursor),
    })
}

pub async fn user_timeline(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let limit = parse_limit(query.limit)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = TimelineService::new(state.db.clone());
    let posts = service.user_timeline(id, cursor, limit + 1).await?;
    Ok(post_page(posts, limit))
}

pub async fn user_timeline_by_username(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let limit = parse_limit(query.limit)?;
    let cursor = parse_cursor(query.cursor)?;

    let account = AccountService::new(state.db.clone())
        .resolve_by_username(&username)
        .await?;

    let service = TimelineService::new(state.db.clone());
    let posts = service.user_timeline(account.id, cursor, limit + 1).await?;
    Ok(post_page(posts, limit))
}

pub async fn my_timeline(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let limit = parse_limit(query.limit)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = TimelineService::new(state.db.clone());
    let posts = service
        .user_timeline(auth.user_id, cursor, limit + 1)
        .await?;
    Ok(post_page(posts, limit))
}

pub async fn home_timeline(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let limit = parse_limit(query.limit)?;
    let cursor = parse_cursor(query.cursor)?;

    let service = TimelineService::new(state.db.clone());
    let posts = service
        .home_timeline(auth.user_id, cursor, limit + 1)
        .await?;
    Ok(post_page(posts, limit))
}
