//! Author model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book author in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    /// Unique identifier
    pub id: i64,
    /// Full name of the author
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Author {
    pub fn new(name: String) -> Self {
        Self {
            id: 0,
            name,
            created_at: Utc::now(),
        }
    }
}
