//! Notification API endpoints
//!
//! All routes are scoped to the authenticated recipient; other users'
//! notifications are indistinguishable from missing ones.
//!
//! - GET /api/v1/notifications - List (optional ?read=true/false filter)
//! - GET /api/v1/notifications/unread - Unread only
//! - POST /api/v1/notifications/{id}/read - Mark one read
//! - POST /api/v1/notifications/read-all - Mark all read
//! - DELETE /api/v1/notifications/{id} - Delete one

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_page, default_page_size, PaginationQuery, MAX_PAGE_SIZE};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{NotificationBrief, NotificationResponse};

/// Query parameters for the notification listing
#[derive(Debug, Deserialize)]
pub struct NotificationListQuery {
    /// Filter by read state when present
    pub read: Option<bool>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

/// A page of notifications, with the stream's unread count alongside
#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub items: Vec<NotificationResponse>,
    pub total: i64,
    pub unread_count: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Response for the mark-all-read action
#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub message: String,
    pub updated_count: u64,
}

/// Build the notifications router (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread", get(unread_notifications))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
        .route("/{id}", delete(delete_notification))
}

/// GET /api/v1/notifications
async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);

    let result = state
        .notification_service
        .list(&user.0, query.read, page, page_size)
        .await?;

    Ok(Json(NotificationListResponse {
        items: result
            .notifications
            .iter()
            .map(NotificationResponse::from)
            .collect(),
        total: result.total,
        unread_count: result.unread_count,
        page,
        page_size,
    }))
}

/// GET /api/v1/notifications/unread
async fn unread_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let (page, page_size) = pagination.clamped();

    let result = state
        .notification_service
        .unread(&user.0, page, page_size)
        .await?;

    Ok(Json(NotificationListResponse {
        items: result
            .notifications
            .iter()
            .map(NotificationResponse::from)
            .collect(),
        total: result.total,
        unread_count: result.unread_count,
        page,
        page_size,
    }))
}

/// POST /api/v1/notifications/{id}/read
async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<NotificationBrief>, ApiError> {
    let notification = state.notification_service.mark_read(id, &user.0).await?;
    Ok(Json(NotificationBrief::from(&notification)))
}

/// POST /api/v1/notifications/read-all
async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated_count = state.notification_service.mark_all_read(&user.0).await?;

    Ok(Json(MarkAllReadResponse {
        message: format!("{} notifications marked as read", updated_count),
        updated_count,
    }))
}

/// DELETE /api/v1/notifications/{id}
async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.notification_service.delete(id, &user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
