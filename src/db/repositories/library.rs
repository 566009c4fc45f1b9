//! Library repository
//!
//! Shelf membership lives in the `library_books` join table; adding a book
//! twice is a no-op, matching many-to-many semantics.

use crate::models::book::BookWithAuthor;
use crate::models::Library;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Library repository trait
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Create a new library
    async fn create(&self, library: &Library) -> Result<Library>;

    /// Get library by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Library>>;

    /// List all libraries alphabetically
    async fn list(&self) -> Result<Vec<Library>>;

    /// Delete a library
    async fn delete(&self, id: i64) -> Result<()>;

    /// Add a book to the shelf. A no-op if already shelved.
    async fn add_book(&self, library_id: i64, book_id: i64) -> Result<()>;

    /// Remove a book from the shelf
    async fn remove_book(&self, library_id: i64, book_id: i64) -> Result<()>;

    /// Whether the given book is on the shelf
    async fn has_book(&self, library_id: i64, book_id: i64) -> Result<bool>;

    /// Shelved books with author names, by title
    async fn books(&self, library_id: i64) -> Result<Vec<BookWithAuthor>>;

    /// Assign (or clear) the librarian. The schema enforces that a user runs
    /// at most one library.
    async fn set_librarian(&self, library_id: i64, librarian_id: Option<i64>) -> Result<()>;
}

/// SQLx-based library repository implementation
pub struct SqlxLibraryRepository {
    pool: SqlitePool,
}

impl SqlxLibraryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryRepository for SqlxLibraryRepository {
    async fn create(&self, library: &Library) -> Result<Library> {
        let result = sqlx::query(
            "INSERT INTO libraries (name, librarian_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&library.name)
        .bind(library.librarian_id)
        .bind(library.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create library")?;

        Ok(Library {
            id: result.last_insert_rowid(),
            ..library.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Library>> {
        let row = sqlx::query(
            "SELECT id, name, librarian_id, created_at FROM libraries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get library")?;

        Ok(row.map(|row| row_to_library(&row)))
    }

    async fn list(&self) -> Result<Vec<Library>> {
        let rows = sqlx::query(
            "SELECT id, name, librarian_id, created_at FROM libraries ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list libraries")?;

        Ok(rows.iter().map(row_to_library).collect())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM libraries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete library")?;

        Ok(())
    }

    async fn add_book(&self, library_id: i64, book_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO library_books (library_id, book_id) VALUES (?, ?)")
            .bind(library_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .context("Failed to shelve book")?;

        Ok(())
    }

    async fn remove_book(&self, library_id: i64, book_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM library_books WHERE library_id = ? AND book_id = ?")
            .bind(library_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .context("Failed to unshelve book")?;

        Ok(())
    }

    async fn has_book(&self, library_id: i64, book_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM library_books WHERE library_id = ? AND book_id = ?",
        )
        .bind(library_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check shelf")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn books(&self, library_id: i64) -> Result<Vec<BookWithAuthor>> {
        let rows = sqlx::query(
            r#"
            SELECT books.id, books.title, books.author_id, authors.name as author_name,
                   books.isbn, books.publication_year, books.created_at, books.updated_at
            FROM library_books
            JOIN books ON books.id = library_books.book_id
            JOIN authors ON authors.id = books.author_id
            WHERE library_books.library_id = ?
            ORDER BY books.title ASC
            "#,
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list shelved books")?;

        Ok(rows
            .iter()
            .map(|row| BookWithAuthor {
                id: row.get("id"),
                title: row.get("title"),
                author_id: row.get("author_id"),
                author_name: row.get("author_name"),
                isbn: row.get("isbn"),
                publication_year: row.get("publication_year"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    async fn set_librarian(&self, library_id: i64, librarian_id: Option<i64>) -> Result<()> {
        sqlx::query("UPDATE libraries SET librarian_id = ? WHERE id = ?")
            .bind(librarian_id)
            .bind(library_id)
            .execute(&self.pool)
            .await
            .context("Failed to set librarian")?;

        Ok(())
    }
}

fn row_to_library(row: &sqlx::sqlite::SqliteRow) -> Library {
    Library {
        id: row.get("id"),
        name: row.get("name"),
        librarian_id: row.get("librarian_id"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        AuthorRepository, BookRepository, SqlxAuthorRepository, SqlxBookRepository,
        SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Author, User, UserRole};

    struct Fixture {
        repo: SqlxLibraryRepository,
        pool: SqlitePool,
        book_id: i64,
        user_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                "librarian".into(),
                "lib@example.com".into(),
                "hash".into(),
                UserRole::Librarian,
            ))
            .await
            .expect("user");

        let author = SqlxAuthorRepository::new(pool.clone())
            .create(&Author::new("Author".into()))
            .await
            .expect("author");

        let book = SqlxBookRepository::new(pool.clone())
            .create(&crate::models::Book::new(
                "Shelved".into(),
                author.id,
                "9780000000001".into(),
                2001,
                user.id,
            ))
            .await
            .expect("book");

        Fixture {
            repo: SqlxLibraryRepository::new(pool.clone()),
            pool,
            book_id: book.id,
            user_id: user.id,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_libraries() {
        let f = setup().await;
        f.repo.create(&Library::new("West Branch".into())).await.expect("create");
        f.repo.create(&Library::new("East Branch".into())).await.expect("create");

        let libraries = f.repo.list().await.expect("list");

        assert_eq!(libraries.len(), 2);
        assert_eq!(libraries[0].name, "East Branch");
    }

    #[tokio::test]
    async fn test_unique_name_constraint() {
        let f = setup().await;
        f.repo.create(&Library::new("Main".into())).await.expect("create");

        assert!(f.repo.create(&Library::new("Main".into())).await.is_err());
    }

    #[tokio::test]
    async fn test_shelve_and_unshelve_book() {
        let f = setup().await;
        let library = f.repo.create(&Library::new("Main".into())).await.expect("create");

        f.repo.add_book(library.id, f.book_id).await.expect("shelve");
        // Shelving twice is a no-op
        f.repo.add_book(library.id, f.book_id).await.expect("shelve again");

        assert!(f.repo.has_book(library.id, f.book_id).await.expect("check"));
        let books = f.repo.books(library.id).await.expect("books");
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Shelved");

        f.repo.remove_book(library.id, f.book_id).await.expect("unshelve");
        assert!(!f.repo.has_book(library.id, f.book_id).await.expect("check"));
    }

    #[tokio::test]
    async fn test_set_librarian() {
        let f = setup().await;
        let library = f.repo.create(&Library::new("Main".into())).await.expect("create");

        f.repo
            .set_librarian(library.id, Some(f.user_id))
            .await
            .expect("assign");

        let found = f.repo.get_by_id(library.id).await.expect("get").expect("found");
        assert_eq!(found.librarian_id, Some(f.user_id));
    }

    #[tokio::test]
    async fn test_librarian_unique_across_libraries() {
        let f = setup().await;
        let first = f.repo.create(&Library::new("First".into())).await.expect("create");
        let second = f.repo.create(&Library::new("Second".into())).await.expect("create");

        f.repo
            .set_librarian(first.id, Some(f.user_id))
            .await
            .expect("assign");

        let result = f.repo.set_librarian(second.id, Some(f.user_id)).await;
        assert!(result.is_err(), "a user may run at most one library");
    }

    #[tokio::test]
    async fn test_deleting_book_clears_shelves() {
        let f = setup().await;
        let library = f.repo.create(&Library::new("Main".into())).await.expect("create");
        f.repo.add_book(library.id, f.book_id).await.expect("shelve");

        SqlxBookRepository::new(f.pool.clone())
            .delete(f.book_id)
            .await
            .expect("delete book");

        assert!(f.repo.books(library.id).await.expect("books").is_empty());
    }
}
