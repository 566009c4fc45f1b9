//! Public site information API
//!
//! - GET /api/v1/site/info - Name and version
//! - GET /api/v1/site/health - Liveness including a database ping

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::AppState;

/// Response for public site info
#[derive(Debug, Serialize)]
pub struct SiteInfoResponse {
    pub name: String,
    pub version: String,
}

/// Response for the health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// Build the public site router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/info", get(site_info))
        .route("/health", get(health))
}

/// GET /api/v1/site/info
async fn site_info() -> Json<SiteInfoResponse> {
    Json(SiteInfoResponse {
        name: "Readwell".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/site/health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database: "ok".to_string(),
            }),
        ),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    database: "unreachable".to_string(),
                }),
            )
        }
    }
}
