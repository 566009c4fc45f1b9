//! Author repository

use crate::models::Author;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Create a new author
    async fn create(&self, author: &Author) -> Result<Author>;

    /// Get author by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Author>>;

    /// List authors with pagination, alphabetically
    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Author>, i64)>;

    /// Rename an author
    async fn update(&self, author: &Author) -> Result<Author>;

    /// Delete an author (cascades to their books)
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based author repository implementation
pub struct SqlxAuthorRepository {
    pool: SqlitePool,
}

impl SqlxAuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn create(&self, author: &Author) -> Result<Author> {
        let result = sqlx::query("INSERT INTO authors (name, created_at) VALUES (?, ?)")
            .bind(&author.name)
            .bind(author.created_at)
            .execute(&self.pool)
            .await
            .context("Failed to create author")?;

        Ok(Author {
            id: result.last_insert_rowid(),
            ..author.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>> {
        let row = sqlx::query("SELECT id, name, created_at FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get author")?;

        Ok(row.map(|row| Author {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        }))
    }

    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Author>, i64)> {
        let offset = (page - 1) * per_page;

        let rows = sqlx::query(
            "SELECT id, name, created_at FROM authors ORDER BY name ASC LIMIT ? OFFSET ?",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list authors")?;

        let authors = rows
            .iter()
            .map(|row| Author {
                id: row.get("id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })
            .collect();

        let total_row = sqlx::query("SELECT COUNT(*) as count FROM authors")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count authors")?;

        Ok((authors, total_row.get("count")))
    }

    async fn update(&self, author: &Author) -> Result<Author> {
        sqlx::query("UPDATE authors SET name = ? WHERE id = ?")
            .bind(&author.name)
            .bind(author.id)
            .execute(&self.pool)
            .await
            .context("Failed to update author")?;

        self.get_by_id(author.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Author not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete author")?;

        Ok(())
    }
}
