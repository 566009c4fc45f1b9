//! Book API endpoints
//!
//! Reads are public; writes require catalog-manager privileges.
//!
//! - GET /api/v1/books - Search/filter/order/paginate the catalog
//! - GET /api/v1/books/{id} - Book detail
//! - POST /api/v1/books - Add a book
//! - PUT /api/v1/books/{id} - Update a book
//! - DELETE /api/v1/books/{id} - Remove a book
//!
//! Query parameters for the listing: `q` (title/author search), `author`
//! (exact author name), `ordering` (whitelisted field, `-` prefix for
//! descending), `page`, `page_size`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, default_page_size, MAX_PAGE_SIZE};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{BookResponse, Paginated};
use crate::db::repositories::BookQuery;
use crate::models::book::{BookInput, BookOrdering};

/// Query parameters for book listings
#[derive(Debug, Deserialize)]
pub struct BookListQuery {
    /// Search term matched against title and author name
    pub q: Option<String>,
    /// Exact author name filter
    pub author: Option<String>,
    /// Ordering key (e.g. `title`, `-publication_year`)
    pub ordering: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

/// Request body for creating or updating a book
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author_id: i64,
    pub isbn: String,
    pub publication_year: i32,
}

/// Public book routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books))
        .route("/{id}", get(book_detail))
}

/// Catalog-manager book routes
pub fn manage_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_book))
        .route("/{id}", put(update_book))
        .route("/{id}", delete(delete_book))
}

/// GET /api/v1/books
async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> Result<Json<Paginated<BookResponse>>, ApiError> {
    let ordering = match query.ordering.as_deref() {
        None | Some("") => BookOrdering::default(),
        Some(raw) => BookOrdering::parse(raw)
            .ok_or_else(|| ApiError::validation_error(format!("Unknown ordering: {}", raw)))?,
    };

    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);

    let (books, total) = state
        .catalog_service
        .search_books(&BookQuery {
            search: query.q,
            author: query.author,
            ordering,
            page,
            per_page: page_size,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to search books: {:#}", e);
            ApiError::internal_error("Failed to search books")
        })?;

    let items = books.iter().map(BookResponse::from).collect();
    Ok(Json(Paginated::new(items, total, page, page_size)))
}

/// GET /api/v1/books/{id}
async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.catalog_service.book(id).await?;
    Ok(Json(BookResponse::from(&book)))
}

/// POST /api/v1/books
async fn create_book(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<BookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state
        .catalog_service
        .create_book(
            BookInput {
                title: body.title,
                author_id: body.author_id,
                isbn: body.isbn,
                publication_year: body.publication_year,
            },
            user.0.id,
        )
        .await?;

    let with_author = state.catalog_service.book(book.id).await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(&with_author))))
}

/// PUT /api/v1/books/{id}
async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .catalog_service
        .update_book(
            id,
            BookInput {
                title: body.title,
                author_id: body.author_id,
                isbn: body.isbn,
                publication_year: body.publication_year,
            },
        )
        .await?;

    let with_author = state.catalog_service.book(book.id).await?;
    Ok(Json(BookResponse::from(&with_author)))
}

/// DELETE /api/v1/books/{id}
async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog_service.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
