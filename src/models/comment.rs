//! Comment model
//!
//! Comments hang off a post and are listed oldest-first, so a thread reads
//! top to bottom in chronological order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment on a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// Post this comment belongs to
    pub post_id: i64,
    /// Authoring user
    pub author_id: i64,
    /// Comment text
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: i64, author_id: i64, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            post_id,
            author_id,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Comment joined with its author's username
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
