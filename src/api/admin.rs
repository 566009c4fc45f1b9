//! Admin API endpoints
//!
//! User administration and operational visibility, gated behind the admin
//! role:
//! - GET /api/v1/admin/users - List users with pagination
//! - PUT /api/v1/admin/users/{id}/role - Change a user's role
//! - PUT /api/v1/admin/users/{id}/status - Ban/unban a user
//! - DELETE /api/v1/admin/users/{id} - Delete a user
//! - GET /api/v1/admin/dashboard - Entity counts
//! - GET /api/v1/admin/stats - Process/system resource stats

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::process;
use std::str::FromStr;
use sysinfo::{Pid, System};

use crate::api::common::AdminPaginationQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::Paginated;
use crate::models::{User, UserRole, UserStatus};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A user row in the admin listing (includes email and status)
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
}

impl From<&User> for AdminUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            status: user.status.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Request body for role changes
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

/// Request body for status changes
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Entity counts for the dashboard
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_users: i64,
    pub total_books: i64,
    pub total_posts: i64,
}

/// Process and system resource stats
#[derive(Debug, Serialize)]
pub struct SystemStatsResponse {
    pub version: String,
    pub memory_bytes: u64,
    pub memory_formatted: String,
    pub system_total_memory: u64,
    pub system_used_memory: u64,
    pub os_name: String,
    pub uptime_seconds: u64,
    pub uptime_formatted: String,
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
}

/// Build the admin router (requires auth + admin middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/role", put(set_role))
        .route("/users/{id}/status", put(set_status))
        .route("/users/{id}", delete(delete_user))
        .route("/dashboard", get(dashboard))
        .route("/stats", get(system_stats))
}

/// GET /api/v1/admin/users
async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<AdminPaginationQuery>,
) -> Result<Json<Paginated<AdminUserResponse>>, ApiError> {
    let (page, per_page) = pagination.clamped();

    let (users, total) = state.user_service.list(page, per_page).await.map_err(|e| {
        tracing::error!("Failed to list users: {:#}", e);
        ApiError::internal_error("Failed to list users")
    })?;

    let items = users.iter().map(AdminUserResponse::from).collect();
    Ok(Json(Paginated::new(items, total, page, per_page)))
}

/// PUT /api/v1/admin/users/{id}/role
async fn set_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RoleRequest>,
) -> Result<Json<AdminUserResponse>, ApiError> {
    let role = UserRole::from_str(&body.role)
        .map_err(|_| ApiError::validation_error(format!("Invalid role: {}", body.role)))?;

    let user = state.user_service.set_role(id, role).await?;
    Ok(Json(AdminUserResponse::from(&user)))
}

/// PUT /api/v1/admin/users/{id}/status
///
/// Banning revokes all of the user's sessions.
async fn set_status(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<AdminUserResponse>, ApiError> {
    let status = UserStatus::from_str(&body.status)
        .map_err(|_| ApiError::validation_error(format!("Invalid status: {}", body.status)))?;

    if admin.0.id == id && status == UserStatus::Banned {
        return Err(ApiError::validation_error("You cannot ban yourself"));
    }

    let user = state.user_service.set_status(id, status).await?;
    Ok(Json(AdminUserResponse::from(&user)))
}

/// DELETE /api/v1/admin/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if admin.0.id == id {
        return Err(ApiError::validation_error("You cannot delete yourself"));
    }

    state.user_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/dashboard - Entity counts
async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let total_users = state.user_service.count().await.map_err(|e| {
        tracing::error!("Failed to count users: {:#}", e);
        ApiError::internal_error("Failed to load dashboard")
    })?;
    let total_books = state.catalog_service.book_count().await.map_err(|e| {
        tracing::error!("Failed to count books: {:#}", e);
        ApiError::internal_error("Failed to load dashboard")
    })?;
    let total_posts = state.post_service.count().await.map_err(|e| {
        tracing::error!("Failed to count posts: {:#}", e);
        ApiError::internal_error("Failed to load dashboard")
    })?;

    Ok(Json(DashboardResponse {
        total_users,
        total_books,
        total_posts,
    }))
}

/// GET /api/v1/admin/stats - Process/system resource stats
async fn system_stats(
    State(state): State<AppState>,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let mut sys = System::new_all();
    sys.refresh_all();

    let pid = Pid::from_u32(process::id());
    let memory_bytes = sys.process(pid).map(|proc| proc.memory()).unwrap_or(0);

    let uptime_seconds = state.request_stats.uptime_seconds();

    Ok(Json(SystemStatsResponse {
        version: APP_VERSION.to_string(),
        memory_bytes,
        memory_formatted: format_bytes(memory_bytes),
        system_total_memory: sys.total_memory(),
        system_used_memory: sys.used_memory(),
        os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
        uptime_seconds,
        uptime_formatted: format_uptime(uptime_seconds),
        total_requests: state.request_stats.total_requests(),
        avg_response_time_ms: state.request_stats.avg_response_time_us() / 1000.0,
    }))
}

/// Format uptime to human readable string
fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Format bytes to human readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
