//! Catalog service
//!
//! Authors, books, and library shelves. Owns the catalog validation rules:
//! ISBNs are normalized to 13 digits and unique, publication years cannot
//! lie in the future, titles and names have length bounds. The public book
//! listing is cached; every catalog write invalidates it.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::{
    AuthorRepository, BookQuery, BookRepository, LibraryRepository, UserRepository,
};
use crate::models::book::{Book, BookInput, BookWithAuthor};
use crate::models::{Author, Library};
use crate::services::ServiceError;
use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Cache key prefix for book listings
const BOOKS_CACHE_PREFIX: &str = "books:list:";
/// Cache TTL for book listings
const BOOKS_CACHE_TTL: Duration = Duration::from_secs(120);

/// Cached page of the public book listing
#[derive(serde::Serialize, serde::Deserialize)]
struct CachedBookPage {
    books: Vec<BookWithAuthor>,
    total: i64,
}

/// Catalog service for authors, books and libraries
pub struct CatalogService {
    author_repo: Arc<dyn AuthorRepository>,
    book_repo: Arc<dyn BookRepository>,
    library_repo: Arc<dyn LibraryRepository>,
    user_repo: Arc<dyn UserRepository>,
    cache: Arc<MemoryCache>,
}

impl CatalogService {
    pub fn new(
        author_repo: Arc<dyn AuthorRepository>,
        book_repo: Arc<dyn BookRepository>,
        library_repo: Arc<dyn LibraryRepository>,
        user_repo: Arc<dyn UserRepository>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            author_repo,
            book_repo,
            library_repo,
            user_repo,
            cache,
        }
    }

    // ========================================================================
    // Authors
    // ========================================================================

    /// Create an author.
    pub async fn create_author(&self, name: &str) -> Result<Author, ServiceError> {
        let name = validate_name(name, "Author name", 255)?;
        let author = self
            .author_repo
            .create(&Author::new(name))
            .await
            .context("Failed to create author")?;
        Ok(author)
    }

    /// Get an author together with their books.
    pub async fn author_with_books(&self, id: i64) -> Result<(Author, Vec<Book>), ServiceError> {
        let author = self
            .author_repo
            .get_by_id(id)
            .await
            .context("Failed to load author")?
            .ok_or_else(|| ServiceError::not_found("Author not found"))?;

        let books = self
            .book_repo
            .list_by_author(id)
            .await
            .context("Failed to load author's books")?;

        Ok((author, books))
    }

    /// List authors with pagination.
    pub async fn list_authors(&self, page: i64, per_page: i64) -> Result<(Vec<Author>, i64)> {
        self.author_repo.list(page, per_page).await
    }

    /// Rename an author.
    pub async fn update_author(&self, id: i64, name: &str) -> Result<Author, ServiceError> {
        let name = validate_name(name, "Author name", 255)?;

        let mut author = self
            .author_repo
            .get_by_id(id)
            .await
            .context("Failed to load author")?
            .ok_or_else(|| ServiceError::not_found("Author not found"))?;

        author.name = name;
        let updated = self
            .author_repo
            .update(&author)
            .await
            .context("Failed to update author")?;

        self.invalidate_book_listings().await;
        Ok(updated)
    }

    /// Delete an author and, by cascade, their books.
    pub async fn delete_author(&self, id: i64) -> Result<(), ServiceError> {
        self.author_repo
            .get_by_id(id)
            .await
            .context("Failed to load author")?
            .ok_or_else(|| ServiceError::not_found("Author not found"))?;

        self.author_repo
            .delete(id)
            .await
            .context("Failed to delete author")?;

        self.invalidate_book_listings().await;
        Ok(())
    }

    // ========================================================================
    // Books
    // ========================================================================

    /// Add a book to the catalog.
    pub async fn create_book(&self, input: BookInput, added_by: i64) -> Result<Book, ServiceError> {
        let (title, isbn) = self.validate_book_input(&input)?;

        self.author_repo
            .get_by_id(input.author_id)
            .await
            .context("Failed to load author")?
            .ok_or_else(|| ServiceError::not_found("Author not found"))?;

        if self
            .book_repo
            .get_by_isbn(&isbn)
            .await
            .context("Failed to check ISBN")?
            .is_some()
        {
            return Err(ServiceError::conflict("A book with this ISBN already exists"));
        }

        let book = self
            .book_repo
            .create(&Book::new(
                title,
                input.author_id,
                isbn,
                input.publication_year,
                added_by,
            ))
            .await
            .context("Failed to create book")?;

        self.invalidate_book_listings().await;
        Ok(book)
    }

    /// Get a book with its author's name.
    pub async fn book(&self, id: i64) -> Result<BookWithAuthor, ServiceError> {
        self.book_repo
            .get_with_author(id)
            .await
            .context("Failed to load book")?
            .ok_or_else(|| ServiceError::not_found("Book not found"))
    }

    /// Search the catalog. Unfiltered first pages are served from cache.
    pub async fn search_books(&self, query: &BookQuery) -> Result<(Vec<BookWithAuthor>, i64)> {
        let cacheable = query.search.is_none() && query.author.is_none();
        let cache_key = format!(
            "{}{}:{}:{:?}",
            BOOKS_CACHE_PREFIX, query.page, query.per_page, query.ordering
        );

        if cacheable {
            if let Some(hit) = self
                .cache
                .get::<CachedBookPage>(&cache_key)
                .await
                .unwrap_or(None)
            {
                return Ok((hit.books, hit.total));
            }
        }

        let (books, total) = self.book_repo.search(query).await?;

        if cacheable {
            let entry = CachedBookPage {
                books: books.clone(),
                total,
            };
            if let Err(e) = self.cache.set(&cache_key, &entry, BOOKS_CACHE_TTL).await {
                tracing::warn!("Failed to cache book listing: {}", e);
            }
        }

        Ok((books, total))
    }

    /// Replace a book's fields.
    pub async fn update_book(&self, id: i64, input: BookInput) -> Result<Book, ServiceError> {
        let (title, isbn) = self.validate_book_input(&input)?;

        let mut book = self
            .book_repo
            .get_by_id(id)
            .await
            .context("Failed to load book")?
            .ok_or_else(|| ServiceError::not_found("Book not found"))?;

        self.author_repo
            .get_by_id(input.author_id)
            .await
            .context("Failed to load author")?
            .ok_or_else(|| ServiceError::not_found("Author not found"))?;

        if let Some(existing) = self
            .book_repo
            .get_by_isbn(&isbn)
            .await
            .context("Failed to check ISBN")?
        {
            if existing.id != id {
                return Err(ServiceError::conflict("A book with this ISBN already exists"));
            }
        }

        book.title = title;
        book.author_id = input.author_id;
        book.isbn = isbn;
        book.publication_year = input.publication_year;

        let updated = self
            .book_repo
            .update(&book)
            .await
            .context("Failed to update book")?;

        self.invalidate_book_listings().await;
        Ok(updated)
    }

    /// Remove a book from the catalog.
    pub async fn delete_book(&self, id: i64) -> Result<(), ServiceError> {
        self.book_repo
            .get_by_id(id)
            .await
            .context("Failed to load book")?
            .ok_or_else(|| ServiceError::not_found("Book not found"))?;

        self.book_repo
            .delete(id)
            .await
            .context("Failed to delete book")?;

        self.invalidate_book_listings().await;
        Ok(())
    }

    /// Total books in the catalog
    pub async fn book_count(&self) -> Result<i64> {
        self.book_repo.count().await
    }

    // ========================================================================
    // Libraries
    // ========================================================================

    /// Create a library.
    pub async fn create_library(&self, name: &str) -> Result<Library, ServiceError> {
        let name = validate_name(name, "Library name", 100)?;

        let created = self
            .library_repo
            .create(&Library::new(name))
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::conflict("A library with this name already exists")
                } else {
                    ServiceError::Internal(e)
                }
            })?;

        Ok(created)
    }

    /// All libraries.
    pub async fn list_libraries(&self) -> Result<Vec<Library>> {
        self.library_repo.list().await
    }

    /// Get a library with its shelved books.
    pub async fn library_with_books(
        &self,
        id: i64,
    ) -> Result<(Library, Vec<BookWithAuthor>), ServiceError> {
        let library = self
            .library_repo
            .get_by_id(id)
            .await
            .context("Failed to load library")?
            .ok_or_else(|| ServiceError::not_found("Library not found"))?;

        let books = self
            .library_repo
            .books(id)
            .await
            .context("Failed to load shelf")?;

        Ok((library, books))
    }

    /// Shelve a book in a library. Idempotent.
    pub async fn shelve_book(&self, library_id: i64, book_id: i64) -> Result<(), ServiceError> {
        self.library_repo
            .get_by_id(library_id)
            .await
            .context("Failed to load library")?
            .ok_or_else(|| ServiceError::not_found("Library not found"))?;
        self.book_repo
            .get_by_id(book_id)
            .await
            .context("Failed to load book")?
            .ok_or_else(|| ServiceError::not_found("Book not found"))?;

        self.library_repo
            .add_book(library_id, book_id)
            .await
            .context("Failed to shelve book")?;
        Ok(())
    }

    /// Remove a book from a library's shelf.
    pub async fn unshelve_book(&self, library_id: i64, book_id: i64) -> Result<(), ServiceError> {
        self.library_repo
            .get_by_id(library_id)
            .await
            .context("Failed to load library")?
            .ok_or_else(|| ServiceError::not_found("Library not found"))?;

        self.library_repo
            .remove_book(library_id, book_id)
            .await
            .context("Failed to unshelve book")?;
        Ok(())
    }

    /// Assign a librarian to a library (or clear the assignment).
    ///
    /// The librarian must hold the Librarian or Admin role, and a user can
    /// run at most one library.
    pub async fn assign_librarian(
        &self,
        library_id: i64,
        librarian_id: Option<i64>,
    ) -> Result<Library, ServiceError> {
        self.library_repo
            .get_by_id(library_id)
            .await
            .context("Failed to load library")?
            .ok_or_else(|| ServiceError::not_found("Library not found"))?;

        if let Some(user_id) = librarian_id {
            let user = self
                .user_repo
                .get_by_id(user_id)
                .await
                .context("Failed to load user")?
                .ok_or_else(|| ServiceError::not_found("User not found"))?;

            if !user.can_manage_catalog() {
                return Err(ServiceError::validation(
                    "Only librarians or admins can be assigned to a library",
                ));
            }
        }

        self.library_repo
            .set_librarian(library_id, librarian_id)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::conflict("This user already runs another library")
                } else {
                    ServiceError::Internal(e)
                }
            })?;

        self.library_repo
            .get_by_id(library_id)
            .await
            .context("Failed to reload library")?
            .ok_or_else(|| ServiceError::not_found("Library not found"))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn invalidate_book_listings(&self) {
        if let Err(e) = self
            .cache
            .delete_pattern(&format!("{}*", BOOKS_CACHE_PREFIX))
            .await
        {
            tracing::warn!("Failed to invalidate book listing cache: {}", e);
        }
    }

    fn validate_book_input(&self, input: &BookInput) -> Result<(String, String), ServiceError> {
        let title = input.title.trim();
        if title.chars().count() < 2 {
            return Err(ServiceError::validation(
                "Title must be at least 2 characters long",
            ));
        }
        if title.chars().count() > 200 {
            return Err(ServiceError::validation(
                "Title must be less than 200 characters",
            ));
        }

        let isbn = normalize_isbn(&input.isbn)?;

        let current_year = Utc::now().year();
        if input.publication_year > current_year {
            return Err(ServiceError::validation(format!(
                "publication_year cannot be in the future (got {}, current year is {})",
                input.publication_year, current_year
            )));
        }
        if input.publication_year < 1000 {
            return Err(ServiceError::validation(
                "Publication year seems too old, please verify",
            ));
        }

        Ok((title.to_string(), isbn))
    }
}

/// Strip non-digits from an ISBN and require exactly 13 digits.
pub fn normalize_isbn(raw: &str) -> Result<String, ServiceError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 13 {
        return Err(ServiceError::validation("ISBN must be exactly 13 digits"));
    }
    Ok(digits)
}

fn validate_name(raw: &str, what: &str, max: usize) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", what)));
    }
    if name.chars().count() > max {
        return Err(ServiceError::validation(format!(
            "{} must be at most {} characters",
            what, max
        )));
    }
    Ok(name.to_string())
}

/// Best-effort detection of SQLite uniqueness violations from anyhow chains.
fn is_unique_violation(error: &anyhow::Error) -> bool {
    format!("{:#}", error).contains("UNIQUE constraint failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{
        SqlxAuthorRepository, SqlxBookRepository, SqlxLibraryRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};

    async fn setup() -> (CatalogService, i64, i64) {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let librarian = users
            .create(&User::new(
                "librarian".into(),
                "lib@example.com".into(),
                "hash".into(),
                UserRole::Librarian,
            ))
            .await
            .expect("librarian");
        let member = users
            .create(&User::new(
                "member".into(),
                "member@example.com".into(),
                "hash".into(),
                UserRole::Member,
            ))
            .await
            .expect("member");

        let service = CatalogService::new(
            Arc::new(SqlxAuthorRepository::new(pool.clone())),
            Arc::new(SqlxBookRepository::new(pool.clone())),
            Arc::new(SqlxLibraryRepository::new(pool.clone())),
            Arc::new(SqlxUserRepository::new(pool)),
            create_cache(&CacheConfig::default()),
        );

        (service, librarian.id, member.id)
    }

    fn input(title: &str, author_id: i64, isbn: &str, year: i32) -> BookInput {
        BookInput {
            title: title.to_string(),
            author_id,
            isbn: isbn.to_string(),
            publication_year: year,
        }
    }

    #[tokio::test]
    async fn test_create_book_normalizes_isbn() {
        let (service, librarian, _) = setup().await;
        let author = service.create_author("Author").await.expect("author");

        let book = service
            .create_book(
                input("Hyphenated", author.id, "978-0-553-57537-8", 1996),
                librarian,
            )
            .await
            .expect("create");

        assert_eq!(book.isbn, "9780553575378");
    }

    #[tokio::test]
    async fn test_create_book_rejects_bad_isbn() {
        let (service, librarian, _) = setup().await;
        let author = service.create_author("Author").await.expect("author");

        let result = service
            .create_book(input("Short ISBN", author.id, "12345", 2000), librarian)
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_book_rejects_future_year() {
        let (service, librarian, _) = setup().await;
        let author = service.create_author("Author").await.expect("author");
        let next_year = Utc::now().year() + 1;

        let result = service
            .create_book(
                input("From the future", author.id, "9780000000001", next_year),
                librarian,
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_isbn_is_conflict() {
        let (service, librarian, _) = setup().await;
        let author = service.create_author("Author").await.expect("author");
        service
            .create_book(input("First", author.id, "9780000000001", 2000), librarian)
            .await
            .expect("create");

        let result = service
            .create_book(input("Second", author.id, "9780000000001", 2001), librarian)
            .await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_book_keeps_own_isbn() {
        let (service, librarian, _) = setup().await;
        let author = service.create_author("Author").await.expect("author");
        let book = service
            .create_book(input("Original", author.id, "9780000000001", 2000), librarian)
            .await
            .expect("create");

        // Same ISBN, new title: not a conflict with itself
        let updated = service
            .update_book(book.id, input("Renamed", author.id, "9780000000001", 2000))
            .await
            .expect("update");

        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn test_author_with_books() {
        let (service, librarian, _) = setup().await;
        let author = service.create_author("Prolific").await.expect("author");
        service
            .create_book(input("One", author.id, "9780000000001", 2000), librarian)
            .await
            .expect("create");
        service
            .create_book(input("Two", author.id, "9780000000002", 2005), librarian)
            .await
            .expect("create");

        let (found, books) = service.author_with_books(author.id).await.expect("get");

        assert_eq!(found.name, "Prolific");
        assert_eq!(books.len(), 2);
        // Ordered by publication year
        assert_eq!(books[0].title, "One");
    }

    #[tokio::test]
    async fn test_search_cache_invalidation_on_write() {
        let (service, librarian, _) = setup().await;
        let author = service.create_author("Author").await.expect("author");
        service
            .create_book(input("First", author.id, "9780000000001", 2000), librarian)
            .await
            .expect("create");

        let query = BookQuery {
            page: 1,
            per_page: 10,
            ..Default::default()
        };

        let (_, total) = service.search_books(&query).await.expect("search");
        assert_eq!(total, 1);

        // A write invalidates the cached page, so the new book appears
        service
            .create_book(input("Second", author.id, "9780000000002", 2001), librarian)
            .await
            .expect("create");

        let (_, total) = service.search_books(&query).await.expect("search");
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_assign_librarian_role_check() {
        let (service, librarian, member) = setup().await;
        let library = service.create_library("Main").await.expect("library");

        // A plain member cannot run a library
        let result = service.assign_librarian(library.id, Some(member)).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let updated = service
            .assign_librarian(library.id, Some(librarian))
            .await
            .expect("assign");
        assert_eq!(updated.librarian_id, Some(librarian));

        // Clearing the assignment works
        let cleared = service
            .assign_librarian(library.id, None)
            .await
            .expect("clear");
        assert_eq!(cleared.librarian_id, None);
    }

    #[tokio::test]
    async fn test_one_library_per_librarian() {
        let (service, librarian, _) = setup().await;
        let first = service.create_library("First").await.expect("library");
        let second = service.create_library("Second").await.expect("library");

        service
            .assign_librarian(first.id, Some(librarian))
            .await
            .expect("assign");

        let result = service.assign_librarian(second.id, Some(librarian)).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_library_name_is_conflict() {
        let (service, _, _) = setup().await;
        service.create_library("Main").await.expect("library");

        let result = service.create_library("Main").await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_shelve_and_unshelve() {
        let (service, librarian, _) = setup().await;
        let author = service.create_author("Author").await.expect("author");
        let book = service
            .create_book(input("Shelved", author.id, "9780000000001", 2000), librarian)
            .await
            .expect("create");
        let library = service.create_library("Main").await.expect("library");

        service.shelve_book(library.id, book.id).await.expect("shelve");
        service.shelve_book(library.id, book.id).await.expect("shelve again");

        let (_, books) = service.library_with_books(library.id).await.expect("get");
        assert_eq!(books.len(), 1);

        service
            .unshelve_book(library.id, book.id)
            .await
            .expect("unshelve");
        let (_, books) = service.library_with_books(library.id).await.expect("get");
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (service, _, _) = setup().await;

        assert!(matches!(
            service.book(999).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.author_with_books(999).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.library_with_books(999).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Normalization keeps exactly the digits and accepts any
        /// 13-digit sequence regardless of separators.
        #[test]
        fn prop_isbn_normalization(digits in "[0-9]{13}", sep in "[- ]{0,3}") {
            let mixed = format!("{}{}{}", &digits[..3], sep, &digits[3..]);
            prop_assert_eq!(normalize_isbn(&mixed).expect("normalize"), digits);
        }

        /// Anything that does not contain exactly 13 digits is rejected.
        #[test]
        fn prop_isbn_wrong_length_rejected(digits in "[0-9]{0,12}") {
            prop_assert!(normalize_isbn(&digits).is_err());
        }
    }
}
