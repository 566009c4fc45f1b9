//! Comment repository

use crate::models::comment::{Comment, CommentWithAuthor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments on a post with author usernames, oldest first
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Update the comment text
    async fn update(&self, comment: &Comment) -> Result<Comment>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<()>;

    /// Number of comments on a post
    async fn count_for_post(&self, post_id: i64) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: SqlitePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO post_comments (post_id, author_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create comment")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..comment.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, author_id, content, created_at, updated_at FROM post_comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get comment")?;

        Ok(row.map(|row| Comment {
            id: row.get("id"),
            post_id: row.get("post_id"),
            author_id: row.get("author_id"),
            content: row.get("content"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query(
            r#"
            SELECT post_comments.id, post_comments.post_id, post_comments.author_id,
                   users.username as author_username,
                   post_comments.content, post_comments.created_at, post_comments.updated_at
            FROM post_comments
            JOIN users ON users.id = post_comments.author_id
            WHERE post_comments.post_id = ?
            ORDER BY post_comments.created_at ASC, post_comments.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comments")?;

        Ok(rows
            .iter()
            .map(|row| CommentWithAuthor {
                id: row.get("id"),
                post_id: row.get("post_id"),
                author_id: row.get("author_id"),
                author_username: row.get("author_username"),
                content: row.get("content"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    async fn update(&self, comment: &Comment) -> Result<Comment> {
        let now = Utc::now();

        sqlx::query("UPDATE post_comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(&comment.content)
            .bind(now)
            .bind(comment.id)
            .execute(&self.pool)
            .await
            .context("Failed to update comment")?;

        self.get_by_id(comment.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM post_comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;

        Ok(())
    }

    async fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM post_comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments")?;

        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{PostRepository, SqlxPostRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Post, User, UserRole};

    async fn setup() -> (SqlxCommentRepository, i64, i64) {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                "commenter".into(),
                "commenter@example.com".into(),
                "hash".into(),
                UserRole::Member,
            ))
            .await
            .expect("user");

        let post = SqlxPostRepository::new(pool.clone())
            .create(&Post::new(user.id, "Post".into(), "body".into()))
            .await
            .expect("post");

        (SqlxCommentRepository::new(pool), post.id, user.id)
    }

    #[tokio::test]
    async fn test_create_and_list_comments_chronological() {
        let (repo, post_id, user_id) = setup().await;
        repo.create(&Comment::new(post_id, user_id, "first".into()))
            .await
            .expect("create");
        repo.create(&Comment::new(post_id, user_id, "second".into()))
            .await
            .expect("create");

        let comments = repo.list_for_post(post_id).await.expect("list");

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "first");
        assert_eq!(comments[1].content, "second");
        assert_eq!(comments[0].author_username, "commenter");
    }

    #[tokio::test]
    async fn test_update_comment() {
        let (repo, post_id, user_id) = setup().await;
        let mut comment = repo
            .create(&Comment::new(post_id, user_id, "typo".into()))
            .await
            .expect("create");

        comment.content = "fixed".into();
        let updated = repo.update(&comment).await.expect("update");

        assert_eq!(updated.content, "fixed");
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let (repo, post_id, user_id) = setup().await;
        let comment = repo
            .create(&Comment::new(post_id, user_id, "gone".into()))
            .await
            .expect("create");

        repo.delete(comment.id).await.expect("delete");

        assert!(repo.get_by_id(comment.id).await.expect("get").is_none());
        assert_eq!(repo.count_for_post(post_id).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_deleting_post_cascades_to_comments() {
        let (repo, post_id, user_id) = setup().await;
        let comment = repo
            .create(&Comment::new(post_id, user_id, "orphaned".into()))
            .await
            .expect("create");

        SqlxPostRepository::new(repo.pool.clone())
            .delete(post_id)
            .await
            .expect("delete post");

        assert!(repo.get_by_id(comment.id).await.expect("get").is_none());
    }
}
