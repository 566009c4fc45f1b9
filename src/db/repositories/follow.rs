//! Follow repository
//!
//! The follow graph is a plain edge table with a composite primary key.
//! Edges are directed and never symmetrical; `add`/`remove` are idempotent
//! the way a many-to-many membership is.

use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Follow graph repository trait
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Add a follow edge. A no-op if the edge already exists.
    async fn add(&self, follower_id: i64, followee_id: i64) -> Result<()>;

    /// Remove a follow edge. A no-op if the edge does not exist.
    async fn remove(&self, follower_id: i64, followee_id: i64) -> Result<()>;

    /// Check whether `follower_id` follows `followee_id`
    async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool>;

    /// Users following `user_id`, newest edge first
    async fn followers(&self, user_id: i64) -> Result<Vec<User>>;

    /// Users that `user_id` follows, newest edge first
    async fn following(&self, user_id: i64) -> Result<Vec<User>>;

    /// Number of users following `user_id`
    async fn follower_count(&self, user_id: i64) -> Result<i64>;

    /// Number of users `user_id` follows
    async fn following_count(&self, user_id: i64) -> Result<i64>;
}

/// SQLx-based follow repository implementation
pub struct SqlxFollowRepository {
    pool: SqlitePool,
}

impl SqlxFollowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for SqlxFollowRepository {
    async fn add(&self, follower_id: i64, followee_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO follows (follower_id, followee_id) VALUES (?, ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await
        .context("Failed to add follow edge")?;

        Ok(())
    }

    async fn remove(&self, follower_id: i64, followee_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await
            .context("Failed to remove follow edge")?;

        Ok(())
    }

    async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM follows WHERE follower_id = ? AND followee_id = ?",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check follow edge")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn followers(&self, user_id: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.role, u.status, u.bio,
                   u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list followers")?;

        rows.iter().map(super::user::row_to_user).collect()
    }

    async fn following(&self, user_id: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.role, u.status, u.bio,
                   u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list following")?;

        rows.iter().map(super::user::row_to_user).collect()
    }

    async fn follower_count(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM follows WHERE followee_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count followers")?;

        Ok(row.get("count"))
    }

    async fn following_count(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM follows WHERE follower_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count following")?;

        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};

    async fn setup() -> (SqlxFollowRepository, i64, i64) {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let alice = users
            .create(&User::new(
                "alice".into(),
                "alice@example.com".into(),
                "hash".into(),
                UserRole::Member,
            ))
            .await
            .expect("alice");
        let bob = users
            .create(&User::new(
                "bob".into(),
                "bob@example.com".into(),
                "hash".into(),
                UserRole::Member,
            ))
            .await
            .expect("bob");

        (SqlxFollowRepository::new(pool), alice.id, bob.id)
    }

    #[tokio::test]
    async fn test_add_and_check_follow() {
        let (repo, alice, bob) = setup().await;

        repo.add(alice, bob).await.expect("follow");

        assert!(repo.is_following(alice, bob).await.expect("check"));
        // Edges are directed: bob does not follow alice back
        assert!(!repo.is_following(bob, alice).await.expect("check"));
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (repo, alice, bob) = setup().await;

        repo.add(alice, bob).await.expect("follow");
        repo.add(alice, bob).await.expect("follow again");

        assert_eq!(repo.follower_count(bob).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (repo, alice, bob) = setup().await;
        repo.add(alice, bob).await.expect("follow");

        repo.remove(alice, bob).await.expect("unfollow");
        repo.remove(alice, bob).await.expect("unfollow again");

        assert!(!repo.is_following(alice, bob).await.expect("check"));
    }

    #[tokio::test]
    async fn test_self_follow_rejected_by_schema() {
        let (repo, alice, _) = setup().await;

        let result = repo.add(alice, alice).await;

        assert!(result.is_err(), "CHECK constraint should reject self-follow");
    }

    #[tokio::test]
    async fn test_followers_and_following_lists() {
        let (repo, alice, bob) = setup().await;
        repo.add(alice, bob).await.expect("follow");

        let followers = repo.followers(bob).await.expect("followers");
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].username, "alice");

        let following = repo.following(alice).await.expect("following");
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].username, "bob");

        assert_eq!(repo.following_count(alice).await.expect("count"), 1);
        assert_eq!(repo.follower_count(alice).await.expect("count"), 0);
    }
}
