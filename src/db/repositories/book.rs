//! Book repository
//!
//! Listings join the authors table so search can match on author name and
//! responses can carry it without a second query.

use crate::models::book::{Book, BookOrdering, BookWithAuthor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Query parameters for book listings
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Case-insensitive substring match against title and author name
    pub search: Option<String>,
    /// Restrict to books by this author name (exact match)
    pub author: Option<String>,
    /// Ordering, validated against the whitelist
    pub ordering: BookOrdering,
    /// 1-indexed page
    pub page: i64,
    /// Page size
    pub per_page: i64,
}

/// Book repository trait
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Create a new book
    async fn create(&self, book: &Book) -> Result<Book>;

    /// Get book by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Book>>;

    /// Get book by normalized ISBN
    async fn get_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    /// Get book with its author's name
    async fn get_with_author(&self, id: i64) -> Result<Option<BookWithAuthor>>;

    /// Search/filter/order/paginate books
    async fn search(&self, query: &BookQuery) -> Result<(Vec<BookWithAuthor>, i64)>;

    /// Books by a given author, oldest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Book>>;

    /// Update a book
    async fn update(&self, book: &Book) -> Result<Book>;

    /// Delete a book
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count all books
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based book repository implementation
pub struct SqlxBookRepository {
    pool: SqlitePool,
}

impl SqlxBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for SqlxBookRepository {
    async fn create(&self, book: &Book) -> Result<Book> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO books (title, author_id, isbn, publication_year, added_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(book.added_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create book")?;

        Ok(Book {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..book.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_BOOK))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get book")?;

        Ok(row.map(|row| row_to_book(&row)))
    }

    async fn get_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("{} WHERE isbn = ?", SELECT_BOOK))
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get book by ISBN")?;

        Ok(row.map(|row| row_to_book(&row)))
    }

    async fn get_with_author(&self, id: i64) -> Result<Option<BookWithAuthor>> {
        let row = sqlx::query(&format!("{} WHERE books.id = ?", SELECT_BOOK_WITH_AUTHOR))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get book with author")?;

        Ok(row.map(|row| row_to_book_with_author(&row)))
    }

    async fn search(&self, query: &BookQuery) -> Result<(Vec<BookWithAuthor>, i64)> {
        let mut conditions = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("(books.title LIKE ? OR authors.name LIKE ?)");
            let pattern = format!("%{}%", search);
            binds.push(pattern.clone());
            binds.push(pattern);
        }
        if let Some(author) = query.author.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("authors.name = ?");
            binds.push(author.to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let list_sql = format!(
            "{}{} ORDER BY {} LIMIT ? OFFSET ?",
            SELECT_BOOK_WITH_AUTHOR,
            where_clause,
            query.ordering.sql()
        );
        let mut list_query = sqlx::query(&list_sql);
        for bind in &binds {
            list_query = list_query.bind(bind);
        }
        let offset = (query.page - 1) * query.per_page;
        let rows = list_query
            .bind(query.per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to search books")?;

        let books = rows.iter().map(row_to_book_with_author).collect();

        let count_sql = format!(
            "SELECT COUNT(*) as count FROM books JOIN authors ON authors.id = books.author_id{}",
            where_clause
        );
        let mut count_query = sqlx::query(&count_sql);
        for bind in &binds {
            count_query = count_query.bind(bind);
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count books")?
            .get("count");

        Ok((books, total))
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "{} WHERE author_id = ? ORDER BY publication_year ASC, id ASC",
            SELECT_BOOK
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list books by author")?;

        Ok(rows.iter().map(row_to_book).collect())
    }

    async fn update(&self, book: &Book) -> Result<Book> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE books
            SET title = ?, author_id = ?, isbn = ?, publication_year = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(now)
        .bind(book.id)
        .execute(&self.pool)
        .await
        .context("Failed to update book")?;

        self.get_by_id(book.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Book not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete book")?;

        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM books")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count books")?;

        Ok(row.get("count"))
    }
}

const SELECT_BOOK: &str =
    "SELECT id, title, author_id, isbn, publication_year, added_by, created_at, updated_at FROM books";

const SELECT_BOOK_WITH_AUTHOR: &str = r#"
    SELECT books.id, books.title, books.author_id, authors.name as author_name,
           books.isbn, books.publication_year, books.created_at, books.updated_at
    FROM books
    JOIN authors ON authors.id = books.author_id
"#;

fn row_to_book(row: &sqlx::sqlite::SqliteRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        author_id: row.get("author_id"),
        isbn: row.get("isbn"),
        publication_year: row.get("publication_year"),
        added_by: row.get("added_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_book_with_author(row: &sqlx::sqlite::SqliteRow) -> BookWithAuthor {
    BookWithAuthor {
        id: row.get("id"),
        title: row.get("title"),
        author_id: row.get("author_id"),
        author_name: row.get("author_name"),
        isbn: row.get("isbn"),
        publication_year: row.get("publication_year"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{AuthorRepository, SqlxAuthorRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Author, User, UserRole};

    struct Fixture {
        repo: SqlxBookRepository,
        author_id: i64,
        other_author_id: i64,
        user_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let authors = SqlxAuthorRepository::new(pool.clone());
        let author = authors
            .create(&Author::new("Iain Banks".into()))
            .await
            .expect("author");
        let other = authors
            .create(&Author::new("Ann Leckie".into()))
            .await
            .expect("author");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                "librarian".into(),
                "lib@example.com".into(),
                "hash".into(),
                UserRole::Librarian,
            ))
            .await
            .expect("user");

        Fixture {
            repo: SqlxBookRepository::new(pool),
            author_id: author.id,
            other_author_id: other.id,
            user_id: user.id,
        }
    }

    fn book(title: &str, author_id: i64, isbn: &str, year: i32, added_by: i64) -> Book {
        Book::new(title.to_string(), author_id, isbn.to_string(), year, added_by)
    }

    #[tokio::test]
    async fn test_create_and_get_book() {
        let f = setup().await;

        let created = f
            .repo
            .create(&book("Excession", f.author_id, "9780553575378", 1996, f.user_id))
            .await
            .expect("create");

        let found = f.repo.get_by_id(created.id).await.expect("get").expect("found");
        assert_eq!(found.title, "Excession");
        assert_eq!(found.publication_year, 1996);
    }

    #[tokio::test]
    async fn test_isbn_unique_constraint() {
        let f = setup().await;
        f.repo
            .create(&book("First", f.author_id, "9780000000001", 2000, f.user_id))
            .await
            .expect("create");

        let result = f
            .repo
            .create(&book("Second", f.author_id, "9780000000001", 2001, f.user_id))
            .await;

        assert!(result.is_err(), "duplicate ISBN should be rejected");
    }

    #[tokio::test]
    async fn test_get_by_isbn() {
        let f = setup().await;
        f.repo
            .create(&book("Ancillary Justice", f.other_author_id, "9780316246620", 2013, f.user_id))
            .await
            .expect("create");

        let found = f
            .repo
            .get_by_isbn("9780316246620")
            .await
            .expect("get")
            .expect("found");
        assert_eq!(found.title, "Ancillary Justice");
    }

    #[tokio::test]
    async fn test_search_matches_title_and_author() {
        let f = setup().await;
        f.repo
            .create(&book("Excession", f.author_id, "9780000000011", 1996, f.user_id))
            .await
            .expect("create");
        f.repo
            .create(&book("Ancillary Sword", f.other_author_id, "9780000000012", 2014, f.user_id))
            .await
            .expect("create");

        let query = BookQuery {
            search: Some("leckie".into()),
            page: 1,
            per_page: 10,
            ..Default::default()
        };
        let (books, total) = f.repo.search(&query).await.expect("search");

        assert_eq!(total, 1);
        assert_eq!(books[0].title, "Ancillary Sword");
        assert_eq!(books[0].author_name, "Ann Leckie");
    }

    #[tokio::test]
    async fn test_search_filters_by_author_name() {
        let f = setup().await;
        f.repo
            .create(&book("Excession", f.author_id, "9780000000021", 1996, f.user_id))
            .await
            .expect("create");
        f.repo
            .create(&book("Provenance", f.other_author_id, "9780000000022", 2017, f.user_id))
            .await
            .expect("create");

        let query = BookQuery {
            author: Some("Iain Banks".into()),
            page: 1,
            per_page: 10,
            ..Default::default()
        };
        let (books, total) = f.repo.search(&query).await.expect("search");

        assert_eq!(total, 1);
        assert_eq!(books[0].title, "Excession");
    }

    #[tokio::test]
    async fn test_search_ordering_by_year_desc() {
        let f = setup().await;
        f.repo
            .create(&book("Older", f.author_id, "9780000000031", 1990, f.user_id))
            .await
            .expect("create");
        f.repo
            .create(&book("Newer", f.author_id, "9780000000032", 2020, f.user_id))
            .await
            .expect("create");

        let query = BookQuery {
            ordering: BookOrdering::YearDesc,
            page: 1,
            per_page: 10,
            ..Default::default()
        };
        let (books, _) = f.repo.search(&query).await.expect("search");

        assert_eq!(books[0].title, "Newer");
        assert_eq!(books[1].title, "Older");
    }

    #[tokio::test]
    async fn test_search_pagination() {
        let f = setup().await;
        for i in 0..5 {
            f.repo
                .create(&book(
                    &format!("Book {}", i),
                    f.author_id,
                    &format!("978000000010{}", i),
                    2000 + i,
                    f.user_id,
                ))
                .await
                .expect("create");
        }

        let query = BookQuery {
            page: 2,
            per_page: 2,
            ..Default::default()
        };
        let (books, total) = f.repo.search(&query).await.expect("search");

        assert_eq!(total, 5);
        assert_eq!(books.len(), 2);
    }

    #[tokio::test]
    async fn test_update_book() {
        let f = setup().await;
        let mut created = f
            .repo
            .create(&book("Draft Title", f.author_id, "9780000000041", 2001, f.user_id))
            .await
            .expect("create");

        created.title = "Final Title".into();
        created.publication_year = 2002;
        let updated = f.repo.update(&created).await.expect("update");

        assert_eq!(updated.title, "Final Title");
        assert_eq!(updated.publication_year, 2002);
    }

    #[tokio::test]
    async fn test_delete_cascades_from_author() {
        let f = setup().await;
        let created = f
            .repo
            .create(&book("Orphaned", f.author_id, "9780000000051", 2001, f.user_id))
            .await
            .expect("create");

        SqlxAuthorRepository::new(f.repo.pool.clone())
            .delete(f.author_id)
            .await
            .expect("delete author");

        assert!(f.repo.get_by_id(created.id).await.expect("get").is_none());
    }
}
