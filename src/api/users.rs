//! User API endpoints
//!
//! - GET /api/v1/users - List users
//! - GET /api/v1/users/{id} - A user's profile
//! - POST /api/v1/users/{id}/follow - Follow a user
//! - POST /api/v1/users/{id}/unfollow - Unfollow a user
//! - GET /api/v1/users/{id}/followers - Who follows them
//! - GET /api/v1/users/{id}/following - Who they follow

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{Paginated, ProfileResponse, UserSummary};
use crate::models::User;

/// Build user summaries, each carrying its follower count.
pub(crate) async fn summarize_users(
    state: &AppState,
    users: &[User],
) -> Result<Vec<UserSummary>, ApiError> {
    let mut items = Vec::with_capacity(users.len());
    for user in users {
        let follower_count = state
            .user_service
            .follower_count(user.id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count followers: {:#}", e);
                ApiError::internal_error("Failed to count followers")
            })?;
        items.push(UserSummary::new(user, follower_count));
    }
    Ok(items)
}

/// Build the users router (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(user_profile))
        .route("/{id}/follow", post(follow_user))
        .route("/{id}/unfollow", post(unfollow_user))
        .route("/{id}/followers", get(followers))
        .route("/{id}/following", get(following))
}

/// GET /api/v1/users - List users, newest first
async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<UserSummary>>, ApiError> {
    let (page, page_size) = pagination.clamped();

    let (users, total) = state
        .user_service
        .list(page, page_size)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:#}", e);
            ApiError::internal_error("Failed to list users")
        })?;

    let items = summarize_users(&state, &users).await?;
    Ok(Json(Paginated::new(items, total, page, page_size)))
}

/// GET /api/v1/users/{id} - Profile with follow counts
async fn user_profile(
    State(state): State<AppState>,
    Extension(viewer): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.user_service.profile(id, Some(viewer.0.id)).await?;
    Ok(Json(ProfileResponse::from(&profile)))
}

/// Response for follow/unfollow actions
#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub message: String,
    pub following: bool,
}

/// POST /api/v1/users/{id}/follow
async fn follow_user(
    State(state): State<AppState>,
    Extension(viewer): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<FollowResponse>, ApiError> {
    state.user_service.follow(&viewer.0, id).await?;

    let profile = state.user_service.profile(id, Some(viewer.0.id)).await?;
    Ok(Json(FollowResponse {
        message: format!("You are now following {}", profile.user.username),
        following: true,
    }))
}

/// POST /api/v1/users/{id}/unfollow
async fn unfollow_user(
    State(state): State<AppState>,
    Extension(viewer): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<FollowResponse>, ApiError> {
    state.user_service.unfollow(&viewer.0, id).await?;

    let profile = state.user_service.profile(id, Some(viewer.0.id)).await?;
    Ok(Json(FollowResponse {
        message: format!("You have unfollowed {}", profile.user.username),
        following: false,
    }))
}

/// GET /api/v1/users/{id}/followers
async fn followers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.user_service.followers(id).await?;
    Ok(Json(summarize_users(&state, &users).await?))
}

/// GET /api/v1/users/{id}/following
async fn following(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.user_service.following(id).await?;
    Ok(Json(summarize_users(&state, &users).await?))
}
