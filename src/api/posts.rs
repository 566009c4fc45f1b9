//! Post API endpoints
//!
//! Listing and reading posts is public; everything else requires auth.
//!
//! - GET /api/v1/posts - Search/filter/paginate posts
//! - GET /api/v1/posts/{id} - Post detail
//! - GET /api/v1/posts/{id}/comments - Comments, oldest first
//! - POST /api/v1/posts - Create a post
//! - PUT /api/v1/posts/{id} - Edit own post
//! - DELETE /api/v1/posts/{id} - Delete own post (admins: any)
//! - GET /api/v1/posts/mine - The caller's posts
//! - POST /api/v1/posts/{id}/comments - Comment on a post
//! - POST /api/v1/posts/{id}/like - Like (409 when already liked)
//! - POST /api/v1/posts/{id}/unlike - Unlike (idempotent)
//! - GET /api/v1/posts/{id}/likes - Who liked the post
//! - GET /api/v1/feed - Posts from followed users

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_page, default_page_size, PaginationQuery, MAX_PAGE_SIZE};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{CommentResponse, Paginated, PostResponse, UserSummary};
use crate::db::repositories::PostQuery;
use crate::models::post::PostOrdering;

/// Query parameters for post listings
#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    /// Search term matched against title and content
    pub q: Option<String>,
    /// Exact author username filter
    pub author: Option<String>,
    /// Ordering key (e.g. `-created_at`, `title`)
    pub ordering: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

/// Request body for creating or editing a post
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
}

/// Request body for a comment
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// Response for like/unlike actions
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub post_id: i64,
    pub like_count: i64,
    pub liked: bool,
}

/// Public post routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{id}", get(post_detail))
        .route("/{id}/comments", get(list_comments))
}

/// Protected post routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/mine", get(my_posts))
        .route("/{id}", put(update_post))
        .route("/{id}", delete(delete_post))
        .route("/{id}/comments", post(create_comment))
        .route("/{id}/like", post(like_post))
        .route("/{id}/unlike", post(unlike_post))
        .route("/{id}/likes", get(post_likes))
}

/// GET /api/v1/posts
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<Paginated<PostResponse>>, ApiError> {
    let ordering = match query.ordering.as_deref() {
        None | Some("") => PostOrdering::default(),
        Some(raw) => PostOrdering::parse(raw)
            .ok_or_else(|| ApiError::validation_error(format!("Unknown ordering: {}", raw)))?,
    };

    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);

    let (posts, total) = state
        .post_service
        .search(&PostQuery {
            search: query.q,
            author: query.author,
            ordering,
            page,
            per_page: page_size,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to search posts: {:#}", e);
            ApiError::internal_error("Failed to search posts")
        })?;

    let items = posts.iter().map(PostResponse::from).collect();
    Ok(Json(Paginated::new(items, total, page, page_size)))
}

/// GET /api/v1/posts/{id}
async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.get(id).await?;
    Ok(Json(PostResponse::from(&post)))
}

/// GET /api/v1/posts/mine
async fn my_posts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<PostResponse>>, ApiError> {
    let (page, page_size) = pagination.clamped();

    let (posts, total) = state
        .post_service
        .mine(&user.0, page, page_size)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list own posts: {:#}", e);
            ApiError::internal_error("Failed to list posts")
        })?;

    let items = posts.iter().map(PostResponse::from).collect();
    Ok(Json(Paginated::new(items, total, page, page_size)))
}

/// GET /api/v1/feed - Posts authored by followed users, newest first
pub async fn feed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<PostResponse>>, ApiError> {
    let (page, page_size) = pagination.clamped();

    let (posts, total) = state
        .post_service
        .feed(&user.0, page, page_size)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load feed: {:#}", e);
            ApiError::internal_error("Failed to load feed")
        })?;

    let items = posts.iter().map(PostResponse::from).collect();
    Ok(Json(Paginated::new(items, total, page, page_size)))
}

/// POST /api/v1/posts
async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .post_service
        .create(&user.0, &body.title, &body.content)
        .await?;

    let with_meta = state.post_service.get(post.id).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(&with_meta))))
}

/// PUT /api/v1/posts/{id}
async fn update_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<PostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    state
        .post_service
        .update(id, &user.0, &body.title, &body.content)
        .await?;

    let with_meta = state.post_service.get(id).await?;
    Ok(Json(PostResponse::from(&with_meta)))
}

/// DELETE /api/v1/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete(id, &user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/posts/{id}/comments
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let comments = state.post_service.comments(id).await?;
    Ok(Json(comments.iter().map(CommentResponse::from).collect()))
}

/// POST /api/v1/posts/{id}/comments
async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .post_service
        .comment(id, &user.0, &body.content)
        .await?;

    // Re-read through the listing join to include the author username
    let comments = state.post_service.comments(id).await?;
    let created = comments
        .iter()
        .find(|c| c.id == comment.id)
        .map(CommentResponse::from)
        .ok_or_else(|| ApiError::internal_error("Comment vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/posts/{id}/like
async fn like_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let like_count = state.post_service.like(id, &user.0).await?;

    Ok(Json(LikeResponse {
        post_id: id,
        like_count,
        liked: true,
    }))
}

/// POST /api/v1/posts/{id}/unlike
async fn unlike_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    let like_count = state.post_service.unlike(id, &user.0).await?;

    Ok(Json(LikeResponse {
        post_id: id,
        like_count,
        liked: false,
    }))
}

/// GET /api/v1/posts/{id}/likes
async fn post_likes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.post_service.likers(id).await?;
    Ok(Json(
        crate::api::users::summarize_users(&state, &users).await?,
    ))
}
