//! Post repository
//!
//! Listings join the users table and aggregate comment/like counts in one
//! query. The feed restricts authorship to the follow graph of the viewer.

use crate::models::post::{Post, PostOrdering, PostWithMeta};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Query parameters for post listings
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Case-insensitive substring match against title and content
    pub search: Option<String>,
    /// Restrict to posts by this author username (exact match)
    pub author: Option<String>,
    /// Ordering, validated against the whitelist
    pub ordering: PostOrdering,
    /// 1-indexed page
    pub page: i64,
    /// Page size
    pub per_page: i64,
}

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get post with author username and interaction counts
    async fn get_with_meta(&self, id: i64) -> Result<Option<PostWithMeta>>;

    /// Search/filter/order/paginate posts
    async fn search(&self, query: &PostQuery) -> Result<(Vec<PostWithMeta>, i64)>;

    /// Posts by one author, newest first
    async fn list_by_author(&self, author_id: i64, page: i64, per_page: i64)
        -> Result<(Vec<PostWithMeta>, i64)>;

    /// Posts by users that `viewer_id` follows, newest first
    async fn feed(&self, viewer_id: i64, page: i64, per_page: i64)
        -> Result<(Vec<PostWithMeta>, i64)>;

    /// Update title and content
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count all posts
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO posts (author_id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        Ok(Post {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..post.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT id, author_id, title, content, created_at, updated_at FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get post")?;

        Ok(row.map(|row| Post {
            id: row.get("id"),
            author_id: row.get("author_id"),
            title: row.get("title"),
            content: row.get("content"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn get_with_meta(&self, id: i64) -> Result<Option<PostWithMeta>> {
        let row = sqlx::query(&format!("{} WHERE posts.id = ?", SELECT_POST_WITH_META))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post with meta")?;

        Ok(row.map(|row| row_to_post_with_meta(&row)))
    }

    async fn search(&self, query: &PostQuery) -> Result<(Vec<PostWithMeta>, i64)> {
        let mut conditions = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("(posts.title LIKE ? OR posts.content LIKE ?)");
            let pattern = format!("%{}%", search);
            binds.push(pattern.clone());
            binds.push(pattern);
        }
        if let Some(author) = query.author.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("users.username = ?");
            binds.push(author.to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let list_sql = format!(
            "{}{} ORDER BY {} LIMIT ? OFFSET ?",
            SELECT_POST_WITH_META,
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
            .context("Failed to search posts")?;

        let posts = rows.iter().map(row_to_post_with_meta).collect();

        let count_sql = format!(
            "SELECT COUNT(*) as count FROM posts JOIN users ON users.id = posts.author_id{}",
            where_clause
        );
        let mut count_query = sqlx::query(&count_sql);
        for bind in &binds {
            count_query = count_query.bind(bind);
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?
            .get("count");

        Ok((posts, total))
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<PostWithMeta>, i64)> {
        let offset = (page - 1) * per_page;

        let rows = sqlx::query(&format!(
            "{} WHERE posts.author_id = ? ORDER BY posts.created_at DESC LIMIT ? OFFSET ?",
            SELECT_POST_WITH_META
        ))
        .bind(author_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts by author")?;

        let posts = rows.iter().map(row_to_post_with_meta).collect();

        let total = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts by author")?
            .get("count");

        Ok((posts, total))
    }

    async fn feed(
        &self,
        viewer_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<PostWithMeta>, i64)> {
        let offset = (page - 1) * per_page;

        let rows = sqlx::query(&format!(
            r#"{} WHERE posts.author_id IN
                   (SELECT followee_id FROM follows WHERE follower_id = ?)
               ORDER BY posts.created_at DESC LIMIT ? OFFSET ?"#,
            SELECT_POST_WITH_META
        ))
        .bind(viewer_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load feed")?;

        let posts = rows.iter().map(row_to_post_with_meta).collect();

        let total = sqlx::query(
            r#"SELECT COUNT(*) as count FROM posts
               WHERE author_id IN (SELECT followee_id FROM follows WHERE follower_id = ?)"#,
        )
        .bind(viewer_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count feed")?
        .get("count");

        Ok((posts, total))
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        let now = Utc::now();

        sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ?")
            .bind(&post.title)
            .bind(&post.content)
            .bind(now)
            .bind(post.id)
            .execute(&self.pool)
            .await
            .context("Failed to update post")?;

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM posts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?;

        Ok(row.get("count"))
    }
}

const SELECT_POST_WITH_META: &str = r#"
    SELECT posts.id, posts.author_id, users.username as author_username,
           posts.title, posts.content, posts.created_at, posts.updated_at,
           (SELECT COUNT(*) FROM post_comments WHERE post_comments.post_id = posts.id) as comment_count,
           (SELECT COUNT(*) FROM post_likes WHERE post_likes.post_id = posts.id) as like_count
    FROM posts
    JOIN users ON users.id = posts.author_id
"#;

fn row_to_post_with_meta(row: &sqlx::sqlite::SqliteRow) -> PostWithMeta {
    PostWithMeta {
        id: row.get("id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        title: row.get("title"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        comment_count: row.get("comment_count"),
        like_count: row.get("like_count"),
    }
}
