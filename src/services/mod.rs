//! Service layer
//!
//! Business rules live here, between the HTTP handlers and the repositories:
//! input validation, uniqueness checks, ownership/permission decisions, and
//! notification fan-in.

pub mod catalog;
pub mod notifications;
pub mod password;
pub mod posts;
pub mod rate_limiter;
pub mod reading_lists;
pub mod reviews;
pub mod users;

pub use catalog::CatalogService;
pub use notifications::NotificationService;
pub use posts::PostService;
pub use rate_limiter::LoginRateLimiter;
pub use reading_lists::ReadingListService;
pub use reviews::ReviewService;
pub use users::{UserService, UserServiceError};

/// Error type shared by the content services (catalog, reviews, reading
/// lists, posts, notifications). The auth-heavy user service has its own
/// richer error enum.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or state conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller lacks permission
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}
