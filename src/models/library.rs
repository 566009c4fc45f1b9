//! Library model
//!
//! A library is a named shelf of books. At most one librarian (a user) is
//! assigned per library, and a user can run at most one library; the
//! one-to-one pairing is enforced by a unique column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A library holding a shelf of books
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    /// Unique identifier
    pub id: i64,
    /// Library name (unique)
    pub name: String,
    /// Assigned librarian, if any
    pub librarian_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Library {
    pub fn new(name: String) -> Self {
        Self {
            id: 0,
            name,
            librarian_id: None,
            created_at: Utc::now(),
        }
    }
}
