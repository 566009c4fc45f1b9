//! Review model
//!
//! One review per (book, reviewer) pair, enforced by a unique constraint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book review with a 1-5 star rating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Unique identifier
    pub id: i64,
    /// Reviewed book
    pub book_id: i64,
    /// Reviewing user
    pub reviewer_id: i64,
    /// Star rating, 1 through 5
    pub rating: i32,
    /// Review text
    pub body: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(book_id: i64, reviewer_id: i64, rating: i32, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            book_id,
            reviewer_id,
            rating,
            body,
            created_at: now,
            updated_at: now,
        }
    }
}
