//! Like repository
//!
//! Likes are rows in a (post_id, user_id) keyed table. `add` reports whether
//! a new row was inserted so the service can distinguish "liked" from
//! "already liked".

use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Like repository trait
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Record a like. Returns `true` if the like was new.
    async fn add(&self, post_id: i64, user_id: i64) -> Result<bool>;

    /// Remove a like. Returns `true` if a like was removed.
    async fn remove(&self, post_id: i64, user_id: i64) -> Result<bool>;

    /// Whether the user has liked the post
    async fn exists(&self, post_id: i64, user_id: i64) -> Result<bool>;

    /// Number of likes on a post
    async fn count_for_post(&self, post_id: i64) -> Result<i64>;

    /// Users who liked a post, newest like first
    async fn users_for_post(&self, post_id: i64) -> Result<Vec<User>>;
}

/// SQLx-based like repository implementation
pub struct SqlxLikeRepository {
    pool: SqlitePool,
}

impl SqlxLikeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for SqlxLikeRepository {
    async fn add(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to add like")?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove like")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM post_likes WHERE post_id = ? AND user_id = ?",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check like")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM post_likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count likes")?;

        Ok(row.get("count"))
    }

    async fn users_for_post(&self, post_id: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.role, u.status, u.bio,
                   u.created_at, u.updated_at
            FROM post_likes l
            JOIN users u ON u.id = l.user_id
            WHERE l.post_id = ?
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list likers")?;

        rows.iter().map(super::user::row_to_user).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{PostRepository, SqlxPostRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Post, User, UserRole};

    async fn setup() -> (SqlxLikeRepository, i64, i64) {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                "liker".into(),
                "liker@example.com".into(),
                "hash".into(),
                UserRole::Member,
            ))
            .await
            .expect("user");

        let post = SqlxPostRepository::new(pool.clone())
            .create(&Post::new(user.id, "Likeable".into(), "body".into()))
            .await
            .expect("post");

        (SqlxLikeRepository::new(pool), post.id, user.id)
    }

    #[tokio::test]
    async fn test_add_like_reports_newness() {
        let (repo, post_id, user_id) = setup().await;

        assert!(repo.add(post_id, user_id).await.expect("add"));
        assert!(!repo.add(post_id, user_id).await.expect("add again"));
        assert_eq!(repo.count_for_post(post_id).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_remove_like_reports_removal() {
        let (repo, post_id, user_id) = setup().await;
        repo.add(post_id, user_id).await.expect("add");

        assert!(repo.remove(post_id, user_id).await.expect("remove"));
        assert!(!repo.remove(post_id, user_id).await.expect("remove again"));
        assert!(!repo.exists(post_id, user_id).await.expect("exists"));
    }

    #[tokio::test]
    async fn test_users_for_post() {
        let (repo, post_id, user_id) = setup().await;
        repo.add(post_id, user_id).await.expect("add");

        let likers = repo.users_for_post(post_id).await.expect("likers");

        assert_eq!(likers.len(), 1);
        assert_eq!(likers[0].username, "liker");
    }
}
