//! Author API endpoints
//!
//! Reads are public; writes require catalog-manager privileges.
//!
//! - GET /api/v1/authors - List authors
//! - GET /api/v1/authors/{id} - Author with nested books
//! - POST /api/v1/authors - Create author
//! - PUT /api/v1/authors/{id} - Rename author
//! - DELETE /api/v1/authors/{id} - Delete author (and their books)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{AuthorDetailResponse, AuthorResponse, BookBrief, Paginated};

/// Request body for creating or renaming an author
#[derive(Debug, Deserialize)]
pub struct AuthorRequest {
    pub name: String,
}

/// Public author routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_authors))
        .route("/{id}", get(author_detail))
}

/// Catalog-manager author routes
pub fn manage_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_author))
        .route("/{id}", put(update_author))
        .route("/{id}", delete(delete_author))
}

/// GET /api/v1/authors
async fn list_authors(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<AuthorResponse>>, ApiError> {
    let (page, page_size) = pagination.clamped();

    let (authors, total) = state
        .catalog_service
        .list_authors(page, page_size)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list authors: {:#}", e);
            ApiError::internal_error("Failed to list authors")
        })?;

    let items = authors.iter().map(AuthorResponse::from).collect();
    Ok(Json(Paginated::new(items, total, page, page_size)))
}

/// GET /api/v1/authors/{id} - Author with their books nested
async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AuthorDetailResponse>, ApiError> {
    let (author, books) = state.catalog_service.author_with_books(id).await?;

    Ok(Json(AuthorDetailResponse {
        id: author.id,
        name: author.name,
        created_at: author.created_at.to_rfc3339(),
        books: books.iter().map(BookBrief::from).collect(),
    }))
}

/// POST /api/v1/authors
async fn create_author(
    State(state): State<AppState>,
    Json(body): Json<AuthorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let author = state.catalog_service.create_author(&body.name).await?;
    Ok((StatusCode::CREATED, Json(AuthorResponse::from(&author))))
}

/// PUT /api/v1/authors/{id}
async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AuthorRequest>,
) -> Result<Json<AuthorResponse>, ApiError> {
    let author = state.catalog_service.update_author(id, &body.name).await?;
    Ok(Json(AuthorResponse::from(&author)))
}

/// DELETE /api/v1/authors/{id}
async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog_service.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
