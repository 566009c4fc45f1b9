//! Reading list repository

use crate::models::book::BookWithAuthor;
use crate::models::ReadingList;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Reading list repository trait
#[async_trait]
pub trait ReadingListRepository: Send + Sync {
    /// Create a new reading list
    async fn create(&self, list: &ReadingList) -> Result<ReadingList>;

    /// Get a reading list by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ReadingList>>;

    /// Lists owned by a user, newest first
    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<ReadingList>>;

    /// Public lists, newest first
    async fn list_public(&self) -> Result<Vec<ReadingList>>;

    /// Update name, description and visibility
    async fn update(&self, list: &ReadingList) -> Result<ReadingList>;

    /// Delete a reading list
    async fn delete(&self, id: i64) -> Result<()>;

    /// Add a book to the list. A no-op if already present.
    async fn add_book(&self, list_id: i64, book_id: i64) -> Result<()>;

    /// Remove a book from the list
    async fn remove_book(&self, list_id: i64, book_id: i64) -> Result<()>;

    /// Books on the list with author names, by title
    async fn books(&self, list_id: i64) -> Result<Vec<BookWithAuthor>>;
}

/// SQLx-based reading list repository implementation
pub struct SqlxReadingListRepository {
    pool: SqlitePool,
}

impl SqlxReadingListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingListRepository for SqlxReadingListRepository {
    async fn create(&self, list: &ReadingList) -> Result<ReadingList> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO reading_lists (owner_id, name, description, is_public, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(list.owner_id)
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.is_public)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create reading list")?;

        Ok(ReadingList {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..list.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ReadingList>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_LIST))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get reading list")?;

        Ok(row.map(|row| row_to_list(&row)))
    }

    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<ReadingList>> {
        let rows = sqlx::query(&format!(
            "{} WHERE owner_id = ? ORDER BY created_at DESC",
            SELECT_LIST
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list reading lists")?;

        Ok(rows.iter().map(row_to_list).collect())
    }

    async fn list_public(&self) -> Result<Vec<ReadingList>> {
        let rows = sqlx::query(&format!(
            "{} WHERE is_public = 1 ORDER BY created_at DESC",
            SELECT_LIST
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list public reading lists")?;

        Ok(rows.iter().map(row_to_list).collect())
    }

    async fn update(&self, list: &ReadingList) -> Result<ReadingList> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE reading_lists
            SET name = ?, description = ?, is_public = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.is_public)
        .bind(now)
        .bind(list.id)
        .execute(&self.pool)
        .await
        .context("Failed to update reading list")?;

        self.get_by_id(list.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Reading list not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM reading_lists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete reading list")?;

        Ok(())
    }

    async fn add_book(&self, list_id: i64, book_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO reading_list_books (list_id, book_id) VALUES (?, ?)")
            .bind(list_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .context("Failed to add book to reading list")?;

        Ok(())
    }

    async fn remove_book(&self, list_id: i64, book_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM reading_list_books WHERE list_id = ? AND book_id = ?")
            .bind(list_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove book from reading list")?;

        Ok(())
    }

    async fn books(&self, list_id: i64) -> Result<Vec<BookWithAuthor>> {
        let rows = sqlx::query(
            r#"
            SELECT books.id, books.title, books.author_id, authors.name as author_name,
                   books.isbn, books.publication_year, books.created_at, books.updated_at
            FROM reading_list_books
            JOIN books ON books.id = reading_list_books.book_id
            JOIN authors ON authors.id = books.author_id
            WHERE reading_list_books.list_id = ?
            ORDER BY books.title ASC
            "#,
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list reading list books")?;

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
}

const SELECT_LIST: &str =
    "SELECT id, owner_id, name, description, is_public, created_at, updated_at FROM reading_lists";

fn row_to_list(row: &sqlx::sqlite::SqliteRow) -> ReadingList {
    ReadingList {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        is_public: row.get("is_public"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
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
    use crate::models::{Author, Book, User, UserRole};

    async fn setup() -> (SqlxReadingListRepository, i64, i64) {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                "collector".into(),
                "collector@example.com".into(),
                "hash".into(),
                UserRole::Member,
            ))
            .await
            .expect("user");

        let author = SqlxAuthorRepository::new(pool.clone())
            .create(&Author::new("Author".into()))
            .await
            .expect("author");

        let book = SqlxBookRepository::new(pool.clone())
            .create(&Book::new(
                "Listed".into(),
                author.id,
                "9780000000001".into(),
                2001,
                user.id,
            ))
            .await
            .expect("book");

        (SqlxReadingListRepository::new(pool), user.id, book.id)
    }

    #[tokio::test]
    async fn test_create_and_get_list() {
        let (repo, owner_id, _) = setup().await;

        let created = repo
            .create(&ReadingList::new(owner_id, "To Read".into(), "".into(), false))
            .await
            .expect("create");

        let found = repo.get_by_id(created.id).await.expect("get").expect("found");
        assert_eq!(found.name, "To Read");
        assert!(!found.is_public);
    }

    #[tokio::test]
    async fn test_public_listing_excludes_private() {
        let (repo, owner_id, _) = setup().await;
        repo.create(&ReadingList::new(owner_id, "Private".into(), "".into(), false))
            .await
            .expect("create");
        repo.create(&ReadingList::new(owner_id, "Public".into(), "".into(), true))
            .await
            .expect("create");

        let public = repo.list_public().await.expect("list");

        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "Public");
    }

    #[tokio::test]
    async fn test_owner_listing() {
        let (repo, owner_id, _) = setup().await;
        repo.create(&ReadingList::new(owner_id, "One".into(), "".into(), false))
            .await
            .expect("create");
        repo.create(&ReadingList::new(owner_id, "Two".into(), "".into(), true))
            .await
            .expect("create");

        let lists = repo.list_for_owner(owner_id).await.expect("list");
        assert_eq!(lists.len(), 2);
    }

    #[tokio::test]
    async fn test_add_and_remove_book() {
        let (repo, owner_id, book_id) = setup().await;
        let list = repo
            .create(&ReadingList::new(owner_id, "To Read".into(), "".into(), false))
            .await
            .expect("create");

        repo.add_book(list.id, book_id).await.expect("add");
        repo.add_book(list.id, book_id).await.expect("add again");

        let books = repo.books(list.id).await.expect("books");
        assert_eq!(books.len(), 1);

        repo.remove_book(list.id, book_id).await.expect("remove");
        assert!(repo.books(list.id).await.expect("books").is_empty());
    }

    #[tokio::test]
    async fn test_update_visibility() {
        let (repo, owner_id, _) = setup().await;
        let mut list = repo
            .create(&ReadingList::new(owner_id, "Hidden".into(), "".into(), false))
            .await
            .expect("create");

        list.is_public = true;
        let updated = repo.update(&list).await.expect("update");

        assert!(updated.is_public);
    }

    #[tokio::test]
    async fn test_delete_list_clears_membership() {
        let (repo, owner_id, book_id) = setup().await;
        let list = repo
            .create(&ReadingList::new(owner_id, "Doomed".into(), "".into(), false))
            .await
            .expect("create");
        repo.add_book(list.id, book_id).await.expect("add");

        repo.delete(list.id).await.expect("delete");

        assert!(repo.get_by_id(list.id).await.expect("get").is_none());
    }
}
