//! Notification model
//!
//! Notifications record that an actor did something relevant to a recipient
//! ("alice started following you", "bob liked your post"). The optional
//! target is stored as a typed (kind, id) pair rather than a free-form
//! reference; the set of notifiable things is closed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verbs used by the platform when creating notifications.
pub mod verbs {
    pub const FOLLOWED: &str = "started following you";
    pub const LIKED_POST: &str = "liked your post";
    pub const COMMENTED: &str = "commented on your post";
    pub const REVIEWED_BOOK: &str = "reviewed a book you added";
}

/// What a notification points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum NotificationTarget {
    Post(i64),
    Comment(i64),
    User(i64),
    Book(i64),
}

impl NotificationTarget {
    /// The (kind, id) column pair for storage.
    pub fn parts(&self) -> (TargetKind, i64) {
        match *self {
            NotificationTarget::Post(id) => (TargetKind::Post, id),
            NotificationTarget::Comment(id) => (TargetKind::Comment, id),
            NotificationTarget::User(id) => (TargetKind::User, id),
            NotificationTarget::Book(id) => (TargetKind::Book, id),
        }
    }

    /// Rebuild a target from its stored column pair.
    pub fn from_parts(kind: TargetKind, id: i64) -> Self {
        match kind {
            TargetKind::Post => NotificationTarget::Post(id),
            TargetKind::Comment => NotificationTarget::Comment(id),
            TargetKind::User => NotificationTarget::User(id),
            TargetKind::Book => NotificationTarget::Book(id),
        }
    }
}

/// Storable target kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
    User,
    Book,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Post => write!(f, "post"),
            TargetKind::Comment => write!(f, "comment"),
            TargetKind::User => write!(f, "user"),
            TargetKind::Book => write!(f, "book"),
        }
    }
}

impl FromStr for TargetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(TargetKind::Post),
            "comment" => Ok(TargetKind::Comment),
            "user" => Ok(TargetKind::User),
            "book" => Ok(TargetKind::Book),
            _ => Err(anyhow::anyhow!("Invalid notification target kind: {}", s)),
        }
    }
}

/// A notification delivered to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: i64,
    /// Receiving user
    pub recipient_id: i64,
    /// User who triggered the notification
    pub actor_id: i64,
    /// Action phrase, e.g. "liked your post"
    pub verb: String,
    /// Optional target of the action
    pub target: Option<NotificationTarget>,
    /// Whether the recipient has seen it
    pub read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: i64,
        actor_id: i64,
        verb: impl Into<String>,
        target: Option<NotificationTarget>,
    ) -> Self {
        Self {
            id: 0,
            recipient_id,
            actor_id,
            verb: verb.into(),
            target,
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parts_round_trip() {
        for target in [
            NotificationTarget::Post(1),
            NotificationTarget::Comment(2),
            NotificationTarget::User(3),
            NotificationTarget::Book(4),
        ] {
            let (kind, id) = target.parts();
            assert_eq!(NotificationTarget::from_parts(kind, id), target);
        }
    }

    #[test]
    fn test_target_kind_round_trip() {
        for kind in [
            TargetKind::Post,
            TargetKind::Comment,
            TargetKind::User,
            TargetKind::Book,
        ] {
            assert_eq!(TargetKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert!(TargetKind::from_str("library").is_err());
    }

    #[test]
    fn test_new_notification_is_unread() {
        let n = Notification::new(1, 2, verbs::FOLLOWED, Some(NotificationTarget::User(1)));
        assert!(!n.read);
        assert_eq!(n.verb, "started following you");
    }
}
