//! Reading list model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-owned collection of books
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingList {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub owner_id: i64,
    /// List name
    pub name: String,
    /// Optional description
    pub description: String,
    /// Whether the list is visible to other users
    pub is_public: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ReadingList {
    pub fn new(owner_id: i64, name: String, description: String, is_public: bool) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            owner_id,
            name,
            description,
            is_public,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` may see this list.
    pub fn visible_to(&self, user_id: i64) -> bool {
        self.is_public || self.owner_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_to() {
        let private = ReadingList::new(1, "to-read".into(), String::new(), false);
        assert!(private.visible_to(1));
        assert!(!private.visible_to(2));

        let public = ReadingList::new(1, "favorites".into(), String::new(), true);
        assert!(public.visible_to(2));
    }
}
