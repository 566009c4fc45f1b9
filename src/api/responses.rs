//! Shared API response types
//!
//! Common response structures used across endpoints, plus the generic
//! pagination envelope. Timestamps go out as RFC 3339 strings.

use serde::Serialize;

use crate::db::repositories::notification::NotificationWithActor;
use crate::db::repositories::review::ReviewWithReviewer;
use crate::models::book::{Book, BookWithAuthor};
use crate::models::comment::CommentWithAuthor;
use crate::models::post::PostWithMeta;
use crate::models::notification::NotificationTarget;
use crate::models::{Author, Library, Notification, ReadingList, User};

// ============================================================================
// Pagination envelope
// ============================================================================

/// A page of items with pagination metadata
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        Self {
            items,
            total,
            page,
            page_size,
            total_pages: super::common::total_pages(total, page_size),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Compact user info for listings (followers, likers, etc.)
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub bio: String,
    pub avatar: String,
    pub follower_count: i64,
}

impl UserSummary {
    pub fn new(user: &User, follower_count: i64) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar_url(),
            follower_count,
        }
    }
}

/// The authenticated user's own account
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub bio: String,
    pub avatar: String,
    pub created_at: String,
}

impl From<&User> for CurrentUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            status: user.status.to_string(),
            bio: user.bio.clone(),
            avatar: user.avatar_url(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// A user's profile as seen by the viewer
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub bio: String,
    pub avatar: String,
    pub role: String,
    pub created_at: String,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_following: bool,
}

impl From<&crate::services::users::Profile> for ProfileResponse {
    fn from(profile: &crate::services::users::Profile) -> Self {
        Self {
            id: profile.user.id,
            username: profile.user.username.clone(),
            bio: profile.user.bio.clone(),
            avatar: profile.user.avatar_url(),
            role: profile.user.role.to_string(),
            created_at: profile.user.created_at.to_rfc3339(),
            follower_count: profile.follower_count,
            following_count: profile.following_count,
            is_following: profile.is_following,
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// An author without their books
#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

impl From<&Author> for AuthorResponse {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.name.clone(),
            created_at: author.created_at.to_rfc3339(),
        }
    }
}

/// An author with their books nested
#[derive(Debug, Serialize)]
pub struct AuthorDetailResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub books: Vec<BookBrief>,
}

/// Book fields as nested under an author
#[derive(Debug, Serialize)]
pub struct BookBrief {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub publication_year: i32,
}

impl From<&Book> for BookBrief {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            publication_year: book.publication_year,
        }
    }
}

/// A book with its author's name
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub author_name: String,
    pub isbn: String,
    pub publication_year: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&BookWithAuthor> for BookResponse {
    fn from(book: &BookWithAuthor) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author_id: book.author_id,
            author_name: book.author_name.clone(),
            isbn: book.isbn.clone(),
            publication_year: book.publication_year,
            created_at: book.created_at.to_rfc3339(),
            updated_at: book.updated_at.to_rfc3339(),
        }
    }
}

/// A library without its shelf
#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub id: i64,
    pub name: String,
    pub librarian_id: Option<i64>,
    pub created_at: String,
}

impl From<&Library> for LibraryResponse {
    fn from(library: &Library) -> Self {
        Self {
            id: library.id,
            name: library.name.clone(),
            librarian_id: library.librarian_id,
            created_at: library.created_at.to_rfc3339(),
        }
    }
}

/// A library with its shelved books
#[derive(Debug, Serialize)]
pub struct LibraryDetailResponse {
    pub id: i64,
    pub name: String,
    pub librarian_id: Option<i64>,
    pub created_at: String,
    pub books: Vec<BookResponse>,
}

// ============================================================================
// Reviews and reading lists
// ============================================================================

/// A review with the reviewer's username
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub book_id: i64,
    pub reviewer_id: i64,
    pub reviewer_username: String,
    pub rating: i32,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ReviewWithReviewer> for ReviewResponse {
    fn from(review: &ReviewWithReviewer) -> Self {
        Self {
            id: review.id,
            book_id: review.book_id,
            reviewer_id: review.reviewer_id,
            reviewer_username: review.reviewer_username.clone(),
            rating: review.rating,
            body: review.body.clone(),
            created_at: review.created_at.to_rfc3339(),
            updated_at: review.updated_at.to_rfc3339(),
        }
    }
}

/// A reading list without its books
#[derive(Debug, Serialize)]
pub struct ReadingListResponse {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ReadingList> for ReadingListResponse {
    fn from(list: &ReadingList) -> Self {
        Self {
            id: list.id,
            owner_id: list.owner_id,
            name: list.name.clone(),
            description: list.description.clone(),
            is_public: list.is_public,
            created_at: list.created_at.to_rfc3339(),
            updated_at: list.updated_at.to_rfc3339(),
        }
    }
}

/// A reading list with its books
#[derive(Debug, Serialize)]
pub struct ReadingListDetailResponse {
    #[serde(flatten)]
    pub list: ReadingListResponse,
    pub books: Vec<BookResponse>,
}

// ============================================================================
// Posts and comments
// ============================================================================

/// A post with author and interaction counts
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub comment_count: i64,
    pub like_count: i64,
}

impl From<&PostWithMeta> for PostResponse {
    fn from(post: &PostWithMeta) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            author_username: post.author_username.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
            comment_count: post.comment_count,
            like_count: post.like_count,
        }
    }
}

/// A comment with its author's username
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&CommentWithAuthor> for CommentResponse {
    fn from(comment: &CommentWithAuthor) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            author_username: comment.author_username.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// A notification with its actor's username
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub actor_id: i64,
    pub actor_username: String,
    pub verb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NotificationTarget>,
    pub read: bool,
    pub created_at: String,
}

impl From<&NotificationWithActor> for NotificationResponse {
    fn from(n: &NotificationWithActor) -> Self {
        Self {
            id: n.id,
            actor_id: n.actor_id,
            actor_username: n.actor_username.clone(),
            verb: n.verb.clone(),
            target: n.target,
            read: n.read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// A bare notification (single-item responses, where the actor is implied by
/// the preceding list call)
#[derive(Debug, Serialize)]
pub struct NotificationBrief {
    pub id: i64,
    pub actor_id: i64,
    pub verb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NotificationTarget>,
    pub read: bool,
    pub created_at: String,
}

impl From<&Notification> for NotificationBrief {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            actor_id: n.actor_id,
            verb: n.verb.clone(),
            target: n.target,
            read: n.read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Generic "it worked" payload with a human-readable message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
