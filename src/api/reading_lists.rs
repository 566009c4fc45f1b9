//! Reading list API endpoints
//!
//! All routes require authentication; visibility of individual lists is
//! decided by the service (owner or public).
//!
//! - GET /api/v1/reading-lists - The caller's lists
//! - GET /api/v1/reading-lists/public - Public lists
//! - POST /api/v1/reading-lists - Create a list
//! - GET /api/v1/reading-lists/{id} - A list with its books
//! - PUT /api/v1/reading-lists/{id} - Update a list
//! - DELETE /api/v1/reading-lists/{id} - Delete a list
//! - POST /api/v1/reading-lists/{id}/books - Add a book
//! - DELETE /api/v1/reading-lists/{id}/books/{book_id} - Remove a book

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{
    BookResponse, ReadingListDetailResponse, ReadingListResponse,
};
use crate::services::reading_lists::ReadingListInput;

/// Request body for creating or updating a reading list
#[derive(Debug, Deserialize)]
pub struct ReadingListRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
}

/// Request body for adding a book to a list
#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub book_id: i64,
}

/// Build the reading lists router (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(my_lists))
        .route("/", post(create_list))
        .route("/public", get(public_lists))
        .route("/{id}", get(list_detail))
        .route("/{id}", put(update_list))
        .route("/{id}", delete(delete_list))
        .route("/{id}/books", post(add_book))
        .route("/{id}/books/{book_id}", delete(remove_book))
}

/// GET /api/v1/reading-lists - The caller's own lists
async fn my_lists(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<ReadingListResponse>>, ApiError> {
    let lists = state.reading_list_service.mine(&user.0).await?;
    Ok(Json(lists.iter().map(ReadingListResponse::from).collect()))
}

/// GET /api/v1/reading-lists/public
async fn public_lists(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReadingListResponse>>, ApiError> {
    let lists = state.reading_list_service.public().await?;
    Ok(Json(lists.iter().map(ReadingListResponse::from).collect()))
}

/// POST /api/v1/reading-lists
async fn create_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ReadingListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let list = state
        .reading_list_service
        .create(
            &user.0,
            ReadingListInput {
                name: body.name,
                description: body.description,
                is_public: body.is_public,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReadingListResponse::from(&list))))
}

/// GET /api/v1/reading-lists/{id}
async fn list_detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ReadingListDetailResponse>, ApiError> {
    let (list, books) = state.reading_list_service.get(id, &user.0).await?;

    Ok(Json(ReadingListDetailResponse {
        list: ReadingListResponse::from(&list),
        books: books.iter().map(BookResponse::from).collect(),
    }))
}

/// PUT /api/v1/reading-lists/{id}
async fn update_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<ReadingListRequest>,
) -> Result<Json<ReadingListResponse>, ApiError> {
    let list = state
        .reading_list_service
        .update(
            id,
            &user.0,
            ReadingListInput {
                name: body.name,
                description: body.description,
                is_public: body.is_public,
            },
        )
        .await?;

    Ok(Json(ReadingListResponse::from(&list)))
}

/// DELETE /api/v1/reading-lists/{id}
async fn delete_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.reading_list_service.delete(id, &user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/reading-lists/{id}/books
async fn add_book(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<AddBookRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .reading_list_service
        .add_book(id, &user.0, body.book_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/reading-lists/{id}/books/{book_id}
async fn remove_book(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, book_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .reading_list_service
        .remove_book(id, &user.0, book_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
