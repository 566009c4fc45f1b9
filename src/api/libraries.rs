//! Library API endpoints
//!
//! Reads are public. Shelf changes require catalog-manager privileges;
//! creating libraries and assigning librarians is admin-only.
//!
//! - GET /api/v1/libraries - List libraries
//! - GET /api/v1/libraries/{id} - Library with its shelf
//! - POST /api/v1/libraries - Create a library (admin)
//! - POST /api/v1/libraries/{id}/books - Shelve a book
//! - DELETE /api/v1/libraries/{id}/books/{book_id} - Unshelve a book
//! - PUT /api/v1/libraries/{id}/librarian - Assign/clear the librarian (admin)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{BookResponse, LibraryDetailResponse, LibraryResponse};

/// Request body for creating a library
#[derive(Debug, Deserialize)]
pub struct LibraryRequest {
    pub name: String,
}

/// Request body for shelving a book
#[derive(Debug, Deserialize)]
pub struct ShelveRequest {
    pub book_id: i64,
}

/// Request body for assigning a librarian (null clears the assignment)
#[derive(Debug, Deserialize)]
pub struct AssignLibrarianRequest {
    pub librarian_id: Option<i64>,
}

/// Public library routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_libraries))
        .route("/{id}", get(library_detail))
}

/// Catalog-manager shelf routes
pub fn manage_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/books", post(shelve_book))
        .route("/{id}/books/{book_id}", delete(unshelve_book))
}

/// Admin library routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_library))
        .route("/{id}/librarian", put(assign_librarian))
}

/// GET /api/v1/libraries
async fn list_libraries(
    State(state): State<AppState>,
) -> Result<Json<Vec<LibraryResponse>>, ApiError> {
    let libraries = state.catalog_service.list_libraries().await.map_err(|e| {
        tracing::error!("Failed to list libraries: {:#}", e);
        ApiError::internal_error("Failed to list libraries")
    })?;

    Ok(Json(libraries.iter().map(LibraryResponse::from).collect()))
}

/// GET /api/v1/libraries/{id} - Library with its shelved books
async fn library_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LibraryDetailResponse>, ApiError> {
    let (library, books) = state.catalog_service.library_with_books(id).await?;

    Ok(Json(LibraryDetailResponse {
        id: library.id,
        name: library.name,
        librarian_id: library.librarian_id,
        created_at: library.created_at.to_rfc3339(),
        books: books.iter().map(BookResponse::from).collect(),
    }))
}

/// POST /api/v1/libraries
async fn create_library(
    State(state): State<AppState>,
    Json(body): Json<LibraryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let library = state.catalog_service.create_library(&body.name).await?;
    Ok((StatusCode::CREATED, Json(LibraryResponse::from(&library))))
}

/// POST /api/v1/libraries/{id}/books
async fn shelve_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ShelveRequest>,
) -> Result<StatusCode, ApiError> {
    state.catalog_service.shelve_book(id, body.book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/libraries/{id}/books/{book_id}
async fn unshelve_book(
    State(state): State<AppState>,
    Path((id, book_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.catalog_service.unshelve_book(id, book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/libraries/{id}/librarian
async fn assign_librarian(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AssignLibrarianRequest>,
) -> Result<Json<LibraryResponse>, ApiError> {
    let library = state
        .catalog_service
        .assign_librarian(id, body.librarian_id)
        .await?;

    Ok(Json(LibraryResponse::from(&library)))
}
