//! Repository layer
//!
//! One repository per entity: a trait defining the data-access interface and
//! a `SqlxXxxRepository` implementation over the shared SQLite pool. Services
//! depend on the traits so tests can run against in-memory SQLite.

pub mod author;
pub mod book;
pub mod comment;
pub mod follow;
pub mod library;
pub mod like;
pub mod notification;
pub mod post;
pub mod reading_list;
pub mod review;
pub mod session;
pub mod user;

pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use book::{BookQuery, BookRepository, SqlxBookRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use follow::{FollowRepository, SqlxFollowRepository};
pub use library::{LibraryRepository, SqlxLibraryRepository};
pub use like::{LikeRepository, SqlxLikeRepository};
pub use notification::{NotificationRepository, NotificationWithActor, SqlxNotificationRepository};
pub use post::{PostQuery, PostRepository, SqlxPostRepository};
pub use reading_list::{ReadingListRepository, SqlxReadingListRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
