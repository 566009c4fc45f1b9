//! Post model
//!
//! User posts shown newest-first in listings and in the follow feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Authoring user
    pub author_id: i64,
    /// Post title
    pub title: String,
    /// Post body
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: i64, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            author_id,
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Post joined with its author's username and interaction counts,
/// as returned by listings and the feed.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithMeta {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comment_count: i64,
    pub like_count: i64,
}

/// Supported orderings for post listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrdering {
    /// Newest first (default)
    #[default]
    CreatedDesc,
    CreatedAsc,
    UpdatedDesc,
    TitleAsc,
}

impl PostOrdering {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "-created_at" => Some(Self::CreatedDesc),
            "created_at" => Some(Self::CreatedAsc),
            "-updated_at" => Some(Self::UpdatedDesc),
            "title" => Some(Self::TitleAsc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Self::CreatedDesc => "posts.created_at DESC",
            Self::CreatedAsc => "posts.created_at ASC",
            Self::UpdatedDesc => "posts.updated_at DESC",
            Self::TitleAsc => "posts.title ASC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parse() {
        assert_eq!(PostOrdering::parse("-created_at"), Some(PostOrdering::CreatedDesc));
        assert_eq!(PostOrdering::parse("title"), Some(PostOrdering::TitleAsc));
        assert_eq!(PostOrdering::parse("content"), None);
    }
}
