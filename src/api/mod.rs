//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1`:
//! - Auth endpoints (register/login/logout/me/profile/password)
//! - User and follow-graph endpoints
//! - Catalog endpoints (authors, books, libraries)
//! - Review and reading list endpoints
//! - Post, comment, like and feed endpoints
//! - Notification endpoints
//! - Admin endpoints (user administration, dashboard, stats)
//! - Site info/health endpoints
//!
//! Reads on the catalog and posts are public; writes require a session, and
//! catalog/library management additionally requires the librarian or admin
//! role.

pub mod admin;
pub mod auth;
pub mod authors;
pub mod books;
pub mod comments;
pub mod common;
pub mod libraries;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod reading_lists;
pub mod responses;
pub mod reviews;
pub mod site;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .nest("/libraries", libraries::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Catalog management routes (need librarian or admin role)
    let librarian_routes = Router::new()
        .nest("/authors", authors::manage_router())
        .nest("/books", books::manage_router())
        .nest("/libraries", libraries::manage_router())
        .route_layer(axum_middleware::from_fn(middleware::require_librarian))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but no particular role)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/users", users::router())
        .nest("/books", reviews::book_protected_router())
        .nest("/reviews", reviews::router())
        .nest("/reading-lists", reading_lists::router())
        .nest("/posts", posts::protected_router())
        .nest("/comments", comments::router())
        .nest("/notifications", notifications::router())
        .route("/feed", get(posts::feed))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/authors", authors::public_router())
        .nest("/books", books::public_router())
        .nest("/books", reviews::book_public_router())
        .nest("/libraries", libraries::public_router())
        .nest("/posts", posts::public_router())
        .nest("/site", site::router())
        .merge(admin_routes)
        .merge(librarian_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
