//! Authentication API endpoints
//!
//! Handles HTTP requests for account management:
//! - POST /api/v1/auth/register - User registration
//! - POST /api/v1/auth/login - User login
//! - POST /api/v1/auth/logout - User logout
//! - GET /api/v1/auth/me - Get current user
//! - PUT /api/v1/auth/profile - Update profile
//! - PUT /api/v1/auth/password - Change password

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, SessionToken};
use crate::api::responses::{CurrentUserResponse, MessageResponse};
use crate::models::user::UpdateProfileInput;
use crate::services::users::{LoginInput, RegisterInput};

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub bio: Option<String>,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for profile updates
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub bio: Option<String>,
}

/// Request body for password changes
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: CurrentUserResponse,
    pub token: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(current_user))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
}

/// POST /api/v1/auth/register - User registration
///
/// The first registered user becomes the admin. On success a session is
/// created right away so the client is logged in.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_service
        .register(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password.clone(),
            password_confirm: body.password_confirm,
            bio: body.bio,
        })
        .await?;

    let session = state
        .user_service
        .login(LoginInput::new(&user.username, &body.password))
        .await?;

    let headers = session_cookie_headers(&state, &session.id)?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            user: CurrentUserResponse::from(&user),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/login - User login
///
/// Rate limited per IP (request volume) and per username (failed attempts).
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip_address = extract_ip_address(&headers);

    if let Some(ip) = ip_address.as_ref().and_then(|s| s.parse().ok()) {
        if state.rate_limiter.is_ip_limited(ip).await {
            return Err(ApiError::with_details(
                "RATE_LIMIT",
                "Too many requests, please try again later",
                serde_json::json!({"retry_after": 60}),
            ));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    if state.rate_limiter.is_username_limited(&body.username).await {
        return Err(ApiError::with_details(
            "RATE_LIMIT",
            "Too many failed attempts, please try again later",
            serde_json::json!({"retry_after": 900}),
        ));
    }

    let session = match state
        .user_service
        .login(LoginInput::new(&body.username, &body.password))
        .await
    {
        Ok(session) => {
            state.rate_limiter.clear_username_attempts(&body.username).await;
            session
        }
        Err(e) => {
            state.rate_limiter.record_failed_attempt(&body.username).await;
            return Err(e.into());
        }
    };

    let user = state
        .user_service
        .validate_session(&session.id)
        .await
        .map_err(|e| {
            tracing::error!("Session validation failed right after login: {:#}", e);
            ApiError::internal_error("Login failed")
        })?
        .ok_or_else(|| ApiError::internal_error("Login failed"))?;

    let headers = session_cookie_headers(&state, &session.id)?;

    Ok((
        StatusCode::OK,
        headers,
        Json(AuthResponse {
            user: CurrentUserResponse::from(&user),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout - Delete the current session
async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Result<impl IntoResponse, ApiError> {
    state.user_service.logout(&token.0).await?;

    // Expire the cookie on the client as well
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );

    Ok((headers, Json(MessageResponse::new("Logged out successfully"))))
}

/// GET /api/v1/auth/me - The authenticated user's own account
async fn current_user(
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse::from(&user.0))
}

/// PUT /api/v1/auth/profile - Update email and/or bio
async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let updated = state
        .user_service
        .update_profile(
            &user.0,
            UpdateProfileInput {
                email: body.email,
                bio: body.bio,
            },
        )
        .await?;

    Ok(Json(CurrentUserResponse::from(&updated)))
}

/// PUT /api/v1/auth/password - Change password
///
/// Verifies the current password and revokes every other session.
async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(token): Extension<SessionToken>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .user_service
        .change_password(&user.0, &body.current_password, &body.new_password, &token.0)
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

fn session_cookie_headers(state: &AppState, token: &str) -> Result<HeaderMap, ApiError> {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token,
        state.auth_config.session_days * 24 * 60 * 60
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|_| ApiError::internal_error("Failed to build session cookie"))?,
    );
    Ok(headers)
}

/// Client IP from proxy headers, if present.
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                return Some(first.trim().to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ip_address_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.9".to_string()));
    }

    #[test]
    fn test_extract_ip_address_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));

        assert_eq!(extract_ip_address(&headers), Some("198.51.100.7".to_string()));
    }

    #[test]
    fn test_extract_ip_address_missing() {
        assert_eq!(extract_ip_address(&HeaderMap::new()), None);
    }
}
