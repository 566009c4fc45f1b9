//! Notification repository
//!
//! All reads are scoped to a recipient; a notification is never visible to
//! anyone but the user it was delivered to.

use crate::models::notification::{Notification, NotificationTarget, TargetKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

/// Notification joined with its actor's username, for list payloads
#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationWithActor {
    pub id: i64,
    pub recipient_id: i64,
    pub actor_id: i64,
    pub actor_username: String,
    pub verb: String,
    pub target: Option<NotificationTarget>,
    pub read: bool,
    pub created_at: chrono::DateTime<Utc>,
}

/// Notification repository trait
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a new notification
    async fn create(&self, notification: &Notification) -> Result<Notification>;

    /// Get one of the recipient's notifications by ID
    async fn get_for_recipient(&self, id: i64, recipient_id: i64) -> Result<Option<Notification>>;

    /// Recipient's notifications newest first, optionally filtered by read state
    async fn list(
        &self,
        recipient_id: i64,
        read: Option<bool>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<NotificationWithActor>, i64)>;

    /// Number of unread notifications for the recipient
    async fn unread_count(&self, recipient_id: i64) -> Result<i64>;

    /// Mark one notification read
    async fn mark_read(&self, id: i64) -> Result<()>;

    /// Mark all of the recipient's notifications read, returning the count
    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64>;

    /// Delete a notification
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based notification repository implementation
pub struct SqlxNotificationRepository {
    pool: SqlitePool,
}

impl SqlxNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification> {
        let now = Utc::now();
        let (target_type, target_id) = match notification.target {
            Some(target) => {
                let (kind, id) = target.parts();
                (Some(kind.to_string()), Some(id))
            }
            None => (None, None),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, actor_id, verb, target_type, target_id, read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.actor_id)
        .bind(&notification.verb)
        .bind(target_type)
        .bind(target_id)
        .bind(notification.read)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create notification")?;

        Ok(Notification {
            id: result.last_insert_rowid(),
            created_at: now,
            ..notification.clone()
        })
    }

    async fn get_for_recipient(&self, id: i64, recipient_id: i64) -> Result<Option<Notification>> {
        let row = sqlx::query(&format!(
            "{} WHERE id = ? AND recipient_id = ?",
            SELECT_NOTIFICATION
        ))
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get notification")?;

        row.map(|row| row_to_notification(&row)).transpose()
    }

    async fn list(
        &self,
        recipient_id: i64,
        read: Option<bool>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<NotificationWithActor>, i64)> {
        let offset = (page - 1) * per_page;

        let read_clause = match read {
            Some(true) => " AND notifications.read = 1",
            Some(false) => " AND notifications.read = 0",
            None => "",
        };

        let rows = sqlx::query(&format!(
            r#"
            SELECT notifications.id, notifications.recipient_id, notifications.actor_id,
                   users.username as actor_username,
                   notifications.verb, notifications.target_type, notifications.target_id,
                   notifications.read, notifications.created_at
            FROM notifications
            JOIN users ON users.id = notifications.actor_id
            WHERE notifications.recipient_id = ?{}
            ORDER BY notifications.created_at DESC, notifications.id DESC
            LIMIT ? OFFSET ?
            "#,
            read_clause
        ))
        .bind(recipient_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list notifications")?;

        let notifications = rows
            .iter()
            .map(row_to_notification_with_actor)
            .collect::<Result<Vec<_>>>()?;

        let total = sqlx::query(&format!(
            "SELECT COUNT(*) as count FROM notifications WHERE notifications.recipient_id = ?{}",
            read_clause
        ))
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count notifications")?
        .get("count");

        Ok((notifications, total))
    }

    async fn unread_count(&self, recipient_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM notifications WHERE recipient_id = ? AND read = 0",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count unread notifications")?;

        Ok(row.get("count"))
    }

    async fn mark_read(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to mark notification read")?;

        Ok(())
    }

    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = 1 WHERE recipient_id = ? AND read = 0")
                .bind(recipient_id)
                .execute(&self.pool)
                .await
                .context("Failed to mark notifications read")?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete notification")?;

        Ok(())
    }
}

const SELECT_NOTIFICATION: &str = r#"
    SELECT id, recipient_id, actor_id, verb, target_type, target_id, read, created_at
    FROM notifications
"#;

fn row_to_target(row: &sqlx::sqlite::SqliteRow) -> Result<Option<NotificationTarget>> {
    let target_type: Option<String> = row.get("target_type");
    let target_id: Option<i64> = row.get("target_id");

    match (target_type, target_id) {
        (Some(kind_str), Some(id)) => {
            let kind = TargetKind::from_str(&kind_str)
                .with_context(|| format!("Invalid target kind in database: {}", kind_str))?;
            Ok(Some(NotificationTarget::from_parts(kind, id)))
        }
        _ => Ok(None),
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification> {
    Ok(Notification {
        id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        actor_id: row.get("actor_id"),
        verb: row.get("verb"),
        target: row_to_target(row)?,
        read: row.get("read"),
        created_at: row.get("created_at"),
    })
}

fn row_to_notification_with_actor(row: &sqlx::sqlite::SqliteRow) -> Result<NotificationWithActor> {
    Ok(NotificationWithActor {
        id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        actor_id: row.get("actor_id"),
        actor_username: row.get("actor_username"),
        verb: row.get("verb"),
        target: row_to_target(row)?,
        read: row.get("read"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::notification::verbs;
    use crate::models::{User, UserRole};

    async fn setup() -> (SqlxNotificationRepository, i64, i64) {
        let pool = create_test_pool().await.expect("pool");
        migrations::run_migrations(&pool).await.expect("migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let recipient = users
            .create(&User::new(
                "recipient".into(),
                "recipient@example.com".into(),
                "hash".into(),
                UserRole::Member,
            ))
            .await
            .expect("recipient");
        let actor = users
            .create(&User::new(
                "actor".into(),
                "actor@example.com".into(),
                "hash".into(),
                UserRole::Member,
            ))
            .await
            .expect("actor");

        (SqlxNotificationRepository::new(pool), recipient.id, actor.id)
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (repo, recipient, actor) = setup().await;

        repo.create(&Notification::new(
            recipient,
            actor,
            verbs::FOLLOWED,
            Some(NotificationTarget::User(recipient)),
        ))
        .await
        .expect("create");

        let (notifications, total) = repo.list(recipient, None, 1, 10).await.expect("list");

        assert_eq!(total, 1);
        assert_eq!(notifications[0].verb, "started following you");
        assert_eq!(
            notifications[0].target,
            Some(NotificationTarget::User(recipient))
        );
        assert!(!notifications[0].read);
    }

    #[tokio::test]
    async fn test_list_filters_by_read_state() {
        let (repo, recipient, actor) = setup().await;
        let first = repo
            .create(&Notification::new(recipient, actor, verbs::LIKED_POST, None))
            .await
            .expect("create");
        repo.create(&Notification::new(recipient, actor, verbs::COMMENTED, None))
            .await
            .expect("create");

        repo.mark_read(first.id).await.expect("mark read");

        let (unread, total) = repo.list(recipient, Some(false), 1, 10).await.expect("list");
        assert_eq!(total, 1);
        assert_eq!(unread[0].verb, verbs::COMMENTED);

        assert_eq!(repo.unread_count(recipient).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_recipient_scoping() {
        let (repo, recipient, actor) = setup().await;
        let n = repo
            .create(&Notification::new(recipient, actor, verbs::FOLLOWED, None))
            .await
            .expect("create");

        // The actor cannot see the recipient's notification
        assert!(repo
            .get_for_recipient(n.id, actor)
            .await
            .expect("get")
            .is_none());
        assert!(repo
            .get_for_recipient(n.id, recipient)
            .await
            .expect("get")
            .is_some());
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let (repo, recipient, actor) = setup().await;
        for _ in 0..3 {
            repo.create(&Notification::new(recipient, actor, verbs::LIKED_POST, None))
                .await
                .expect("create");
        }

        let updated = repo.mark_all_read(recipient).await.expect("mark all");

        assert_eq!(updated, 3);
        assert_eq!(repo.unread_count(recipient).await.expect("count"), 0);

        // Second call has nothing left to update
        assert_eq!(repo.mark_all_read(recipient).await.expect("mark all"), 0);
    }

    #[tokio::test]
    async fn test_delete_notification() {
        let (repo, recipient, actor) = setup().await;
        let n = repo
            .create(&Notification::new(recipient, actor, verbs::FOLLOWED, None))
            .await
            .expect("create");

        repo.delete(n.id).await.expect("delete");

        assert!(repo
            .get_for_recipient(n.id, recipient)
            .await
            .expect("get")
            .is_none());
    }
}
