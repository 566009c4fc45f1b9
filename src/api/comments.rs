//! Comment API endpoints
//!
//! Comments are created and listed under their post (see `posts`); this
//! module covers direct addressing for edits and deletes.
//!
//! - PUT /api/v1/comments/{id} - Edit own comment
//! - DELETE /api/v1/comments/{id} - Delete own comment (admins: any)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::Comment;

/// Request body for editing a comment
#[derive(Debug, Deserialize)]
pub struct CommentUpdateRequest {
    pub content: String,
}

/// A comment as returned after an edit
#[derive(Debug, Serialize)]
pub struct OwnCommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Comment> for OwnCommentResponse {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content.clone(),
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.to_rfc3339(),
        }
    }
}

/// Build the comments router (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", put(update_comment))
        .route("/{id}", delete(delete_comment))
}

/// PUT /api/v1/comments/{id}
async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<CommentUpdateRequest>,
) -> Result<Json<OwnCommentResponse>, ApiError> {
    let comment = state
        .post_service
        .update_comment(id, &user.0, &body.content)
        .await?;

    Ok(Json(OwnCommentResponse::from(&comment)))
}

/// DELETE /api/v1/comments/{id}
async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete_comment(id, &user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
