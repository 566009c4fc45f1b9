//! Notification service
//!
//! Read-side operations over a user's notification stream. Creation happens
//! inside the services that own the triggering events (follow, like,
//! comment, review).

use crate::db::repositories::notification::NotificationWithActor;
use crate::db::repositories::NotificationRepository;
use crate::models::{Notification, User};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

/// A page of notifications with the stream's unread count
#[derive(Debug)]
pub struct NotificationPage {
    pub notifications: Vec<NotificationWithActor>,
    pub total: i64,
    pub unread_count: i64,
}

/// Notification service
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// The caller's notifications, optionally filtered by read state.
    pub async fn list(
        &self,
        user: &User,
        read: Option<bool>,
        page: i64,
        per_page: i64,
    ) -> Result<NotificationPage, ServiceError> {
        let (notifications, total) = self
            .repo
            .list(user.id, read, page, per_page)
            .await
            .context("Failed to list notifications")?;
        let unread_count = self
            .repo
            .unread_count(user.id)
            .await
            .context("Failed to count unread notifications")?;

        Ok(NotificationPage {
            notifications,
            total,
            unread_count,
        })
    }

    /// Unread notifications only.
    pub async fn unread(
        &self,
        user: &User,
        page: i64,
        per_page: i64,
    ) -> Result<NotificationPage, ServiceError> {
        self.list(user, Some(false), page, per_page).await
    }

    /// Mark one of the caller's notifications read.
    pub async fn mark_read(&self, id: i64, user: &User) -> Result<Notification, ServiceError> {
        let notification = self.load(id, user).await?;

        if !notification.read {
            self.repo
                .mark_read(id)
                .await
                .context("Failed to mark notification read")?;
        }

        self.load(id, user).await
    }

    /// Mark all of the caller's notifications read, returning the count.
    pub async fn mark_all_read(&self, user: &User) -> Result<u64, ServiceError> {
        Ok(self
            .repo
            .mark_all_read(user.id)
            .await
            .context("Failed to mark notifications read")?)
    }

    /// Delete one of the caller's notifications.
    pub async fn delete(&self, id: i64, user: &User) -> Result<(), ServiceError> {
        self.load(id, user).await?;
        self.repo
            .delete(id)
            .await
            .context("Failed to delete notification")?;
        Ok(())
    }

    /// Unread count for the caller.
    pub async fn unread_count(&self, user: &User) -> Result<i64, ServiceError> {
        Ok(self
            .repo
            .unread_count(user.id)
            .await
            .context("Failed to count unread notifications")?)
    }

    async fn load(&self, id: i64, user: &User) -> Result<Notification, ServiceError> {
        // Scoped lookup: someone else's notification is indistinguishable
        // from a missing one
        self.repo
            .get_for_recipient(id, user.id)
            .await
            .context("Failed to load notification")?
            .ok_or_else(|| ServiceError::not_found("Notification not found"))
    }
}
