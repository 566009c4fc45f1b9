//! Review API endpoints
//!
//! Reviews live under books for creation and listing; edits and deletes
//! address the review directly.
//!
//! - GET /api/v1/books/{id}/reviews - Reviews for a book (public)
//! - POST /api/v1/books/{id}/reviews - Review a book (one per reader)
//! - PUT /api/v1/reviews/{id} - Edit own review
//! - DELETE /api/v1/reviews/{id} - Delete own review (admins: any)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ReviewResponse;
use crate::models::Review;

/// Request body for creating or editing a review
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    pub body: String,
}

/// A review as returned right after a write (no username join needed,
/// the caller wrote it)
#[derive(Debug, Serialize)]
pub struct OwnReviewResponse {
    pub id: i64,
    pub book_id: i64,
    pub rating: i32,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Review> for OwnReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            book_id: review.book_id,
            rating: review.rating,
            body: review.body.clone(),
            created_at: review.created_at.to_rfc3339(),
            updated_at: review.updated_at.to_rfc3339(),
        }
    }
}

/// Public review routes (nested under /books)
pub fn book_public_router() -> Router<AppState> {
    Router::new().route("/{id}/reviews", get(list_reviews))
}

/// Protected review routes (nested under /books)
pub fn book_protected_router() -> Router<AppState> {
    Router::new().route("/{id}/reviews", post(create_review))
}

/// Protected review routes addressing reviews directly
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", put(update_review))
        .route("/{id}", delete(delete_review))
}

/// GET /api/v1/books/{id}/reviews
async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let reviews = state.review_service.list_for_book(id).await?;
    Ok(Json(reviews.iter().map(ReviewResponse::from).collect()))
}

/// POST /api/v1/books/{id}/reviews
async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state
        .review_service
        .create(id, &user.0, body.rating, &body.body)
        .await?;

    Ok((StatusCode::CREATED, Json(OwnReviewResponse::from(&review))))
}

/// PUT /api/v1/reviews/{id}
async fn update_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<OwnReviewResponse>, ApiError> {
    let review = state
        .review_service
        .update(id, &user.0, body.rating, &body.body)
        .await?;

    Ok(Json(OwnReviewResponse::from(&review)))
}

/// DELETE /api/v1/reviews/{id}
async fn delete_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.review_service.delete(id, &user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
