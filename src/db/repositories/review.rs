//! Review repository
//!
//! The (book_id, reviewer_id) unique constraint makes the one-review-per-
//! reader rule a database invariant; `create` surfaces a violation as an
//! error for the service layer to translate.

use crate::models::Review;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Review joined with the reviewer's username
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReviewWithReviewer {
    pub id: i64,
    pub book_id: i64,
    pub reviewer_id: i64,
    pub reviewer_username: String,
    pub rating: i32,
    pub body: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// Review repository trait
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Create a new review
    async fn create(&self, review: &Review) -> Result<Review>;

    /// Get review by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Review>>;

    /// Get the review a user wrote for a book, if any
    async fn get_for_book_and_reviewer(
        &self,
        book_id: i64,
        reviewer_id: i64,
    ) -> Result<Option<Review>>;

    /// Reviews for a book, newest first
    async fn list_for_book(&self, book_id: i64) -> Result<Vec<ReviewWithReviewer>>;

    /// Update rating and body of a review
    async fn update(&self, review: &Review) -> Result<Review>;

    /// Delete a review
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based review repository implementation
pub struct SqlxReviewRepository {
    pool: SqlitePool,
}

impl SqlxReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn create(&self, review: &Review) -> Result<Review> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO reviews (book_id, reviewer_id, rating, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(review.book_id)
        .bind(review.reviewer_id)
        .bind(review.rating)
        .bind(&review.body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create review")?;

        Ok(Review {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..review.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_REVIEW))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get review")?;

        Ok(row.map(|row| row_to_review(&row)))
    }

    async fn get_for_book_and_reviewer(
        &self,
        book_id: i64,
        reviewer_id: i64,
    ) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "{} WHERE book_id = ? AND reviewer_id = ?",
            SELECT_REVIEW
        ))
        .bind(book_id)
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get review for book and reviewer")?;

        Ok(row.map(|row| row_to_review(&row)))
    }

    async fn list_for_book(&self, book_id: i64) -> Result<Vec<ReviewWithReviewer>> {
        let rows = sqlx::query(
            r#"
            SELECT reviews.id, reviews.book_id, reviews.reviewer_id,
                   users.username as reviewer_username,
                   reviews.rating, reviews.body, reviews.created_at, reviews.updated_at
            FROM reviews
            JOIN users ON users.id = reviews.reviewer_id
            WHERE reviews.book_id = ?
            ORDER BY reviews.created_at DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list reviews")?;

        Ok(rows
            .iter()
            .map(|row| ReviewWithReviewer {
                id: row.get("id"),
                book_id: row.get("book_id"),
                reviewer_id: row.get("reviewer_id"),
                reviewer_username: row.get("reviewer_username"),
                rating: row.get("rating"),
                body: row.get("body"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    async fn update(&self, review: &Review) -> Result<Review> {
        let now = Utc::now();

        sqlx::query("UPDATE reviews SET rating = ?, body = ?, updated_at = ? WHERE id = ?")
            .bind(review.rating)
            .bind(&review.body)
            .bind(now)
            .bind(review.id)
            .execute(&self.pool)
            .await
            .context("Failed to update review")?;

        self.get_by_id(review.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Review not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete review")?;

        Ok(())
    }
}

const SELECT_REVIEW: &str =
    "SELECT id, book_id, reviewer_id, rating, body, created_at, updated_at FROM reviews";

fn row_to_review(row: &sqlx::sqlite::SqliteRow) -> Review {
    Review {
        id: row.get("id"),
        book_id: row.get("book_id"),
        reviewer_id: row.get("reviewer_id"),
        rating: row.get("rating"),
        body: row.get("body"),
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

    async fn setup() -> (SqlxReviewRepository, i64, i64) {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                "reader".into(),
                "reader@example.com".into(),
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
                "Reviewed".into(),
                author.id,
                "9780000000001".into(),
                2001,
                user.id,
            ))
            .await
            .expect("book");

        (SqlxReviewRepository::new(pool), book.id, user.id)
    }

    #[tokio::test]
    async fn test_create_and_get_review() {
        let (repo, book_id, user_id) = setup().await;

        let created = repo
            .create(&Review::new(book_id, user_id, 4, "Solid read".into()))
            .await
            .expect("create");

        let found = repo.get_by_id(created.id).await.expect("get").expect("found");
        assert_eq!(found.rating, 4);
        assert_eq!(found.body, "Solid read");
    }

    #[tokio::test]
    async fn test_one_review_per_reader() {
        let (repo, book_id, user_id) = setup().await;
        repo.create(&Review::new(book_id, user_id, 5, "First".into()))
            .await
            .expect("create");

        let result = repo
            .create(&Review::new(book_id, user_id, 1, "Second".into()))
            .await;

        assert!(result.is_err(), "unique (book, reviewer) should hold");
    }

    #[tokio::test]
    async fn test_rating_bounds_enforced_by_schema() {
        let (repo, book_id, user_id) = setup().await;

        let result = repo
            .create(&Review::new(book_id, user_id, 6, "Too good".into()))
            .await;

        assert!(result.is_err(), "rating above 5 should be rejected");
    }

    #[tokio::test]
    async fn test_list_for_book_includes_reviewer() {
        let (repo, book_id, user_id) = setup().await;
        repo.create(&Review::new(book_id, user_id, 3, "Fine".into()))
            .await
            .expect("create");

        let reviews = repo.list_for_book(book_id).await.expect("list");

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].reviewer_username, "reader");
    }

    #[tokio::test]
    async fn test_update_review() {
        let (repo, book_id, user_id) = setup().await;
        let mut review = repo
            .create(&Review::new(book_id, user_id, 2, "Meh".into()))
            .await
            .expect("create");

        review.rating = 4;
        review.body = "Grew on me".into();
        let updated = repo.update(&review).await.expect("update");

        assert_eq!(updated.rating, 4);
        assert_eq!(updated.body, "Grew on me");
    }

    #[tokio::test]
    async fn test_delete_review() {
        let (repo, book_id, user_id) = setup().await;
        let review = repo
            .create(&Review::new(book_id, user_id, 3, "Gone".into()))
            .await
            .expect("create");

        repo.delete(review.id).await.expect("delete");

        assert!(repo.get_by_id(review.id).await.expect("get").is_none());
    }
}
