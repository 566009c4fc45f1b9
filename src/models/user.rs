//! User model
//!
//! Defines the User entity together with the role and status enums used for
//! authorization decisions across the platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered member of the platform.
///
/// Users carry one of three roles (Admin, Librarian, Member) which determine
/// what they may do with the catalog and the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// User status (active/banned)
    pub status: UserStatus,
    /// Short biography
    pub bio: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            role,
            status: UserStatus::Active,
            bio: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the user may manage the catalog (books, authors, shelves).
    ///
    /// Admins and Librarians may; Members may not.
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Librarian)
    }

    /// Check if the user can edit content owned by `author_id`.
    ///
    /// Admins can edit anything. Everyone else only their own content.
    pub fn can_edit(&self, author_id: i64) -> bool {
        self.is_admin() || self.id == author_id
    }

    /// Check if the user is banned
    pub fn is_banned(&self) -> bool {
        self.status == UserStatus::Banned
    }

    /// Gravatar URL derived from the user's email address.
    pub fn avatar_url(&self) -> String {
        gravatar_url(&self.email)
    }
}

/// Build a gravatar URL for an email address.
pub fn gravatar_url(email: &str) -> String {
    if email.is_empty() {
        return "https://www.gravatar.com/avatar/?d=mp&s=80".to_string();
    }
    let hash = format!("{:x}", md5::compute(email.trim().to_lowercase()));
    format!("https://www.gravatar.com/avatar/{}?d=mp&s=80", hash)
}

/// User role for authorization.
///
/// - Admin: full access, including user administration
/// - Librarian: may manage the catalog and their library's shelf
/// - Member: may review, keep reading lists, post and follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator - full access
    Admin,
    /// Librarian - catalog management
    Librarian,
    /// Member - regular user
    Member,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Member
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Librarian => write!(f, "librarian"),
            UserRole::Member => write!(f, "member"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "librarian" => Ok(UserRole::Librarian),
            "member" => Ok(UserRole::Member),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// User status for account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Active - normal access
    Active,
    /// Banned - cannot login
    Banned,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Banned => write!(f, "banned"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "banned" => Ok(UserStatus::Banned),
            _ => Err(anyhow::anyhow!("Invalid user status: {}", s)),
        }
    }
}

/// Input for updating a user's profile
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    /// New email (optional)
    pub email: Option<String>,
    /// New bio (optional)
    pub bio: Option<String>,
}
