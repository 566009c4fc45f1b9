//! Book model
//!
//! Books belong to exactly one author and carry a normalized 13-digit ISBN
//! that is unique across the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Owning author
    pub author_id: i64,
    /// Normalized 13-digit ISBN (unique)
    pub isbn: String,
    /// Year the book was published
    pub publication_year: i32,
    /// User who added the book to the catalog
    pub added_by: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn new(
        title: String,
        author_id: i64,
        isbn: String,
        publication_year: i32,
        added_by: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title,
            author_id,
            isbn,
            publication_year,
            added_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Book joined with its author's name, as returned by catalog listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookWithAuthor {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub author_name: String,
    pub isbn: String,
    pub publication_year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a book
#[derive(Debug, Clone)]
pub struct BookInput {
    pub title: String,
    pub author_id: i64,
    pub isbn: String,
    pub publication_year: i32,
}

/// Supported orderings for book listings.
///
/// The accepted values mirror the query strings clients send
/// (`?ordering=-created_at` style, leading dash for descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookOrdering {
    #[default]
    IdAsc,
    TitleAsc,
    TitleDesc,
    YearAsc,
    YearDesc,
    CreatedDesc,
}

impl BookOrdering {
    /// Parse a client-supplied ordering string; unknown values are rejected
    /// so arbitrary SQL can never reach the ORDER BY clause.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::IdAsc),
            "title" => Some(Self::TitleAsc),
            "-title" => Some(Self::TitleDesc),
            "publication_year" => Some(Self::YearAsc),
            "-publication_year" => Some(Self::YearDesc),
            "-created_at" => Some(Self::CreatedDesc),
            _ => None,
        }
    }

    /// The ORDER BY fragment for this ordering.
    pub fn sql(&self) -> &'static str {
        match self {
            Self::IdAsc => "books.id ASC",
            Self::TitleAsc => "books.title ASC",
            Self::TitleDesc => "books.title DESC",
            Self::YearAsc => "books.publication_year ASC",
            Self::YearDesc => "books.publication_year DESC",
            Self::CreatedDesc => "books.created_at DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parse_known_values() {
        assert_eq!(BookOrdering::parse("title"), Some(BookOrdering::TitleAsc));
        assert_eq!(BookOrdering::parse("-title"), Some(BookOrdering::TitleDesc));
        assert_eq!(
            BookOrdering::parse("-publication_year"),
            Some(BookOrdering::YearDesc)
        );
    }

    #[test]
    fn test_ordering_rejects_unknown_values() {
        assert_eq!(BookOrdering::parse("isbn; DROP TABLE books"), None);
        assert_eq!(BookOrdering::parse(""), None);
    }

    #[test]
    fn test_default_ordering() {
        assert_eq!(BookOrdering::default().sql(), "books.id ASC");
    }
}
