//! Post service
//!
//! Posts, comments, likes, and the follow feed. Writes are author-or-admin
//! guarded; likes and comments notify the post's author.

use crate::db::repositories::{
    CommentRepository, LikeRepository, NotificationRepository, PostQuery, PostRepository,
};
use crate::models::comment::{Comment, CommentWithAuthor};
use crate::models::notification::{verbs, Notification, NotificationTarget};
use crate::models::post::{Post, PostWithMeta};
use crate::models::User;
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

/// Maximum comment length in characters
const MAX_COMMENT_LENGTH: usize = 1000;
/// Maximum post title length in characters
const MAX_TITLE_LENGTH: usize = 200;

/// Post service
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    like_repo: Arc<dyn LikeRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        like_repo: Arc<dyn LikeRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            like_repo,
            notification_repo,
        }
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// Create a post.
    pub async fn create(
        &self,
        author: &User,
        title: &str,
        content: &str,
    ) -> Result<Post, ServiceError> {
        let (title, content) = validate_post(title, content)?;

        Ok(self
            .post_repo
            .create(&Post::new(author.id, title, content))
            .await
            .context("Failed to create post")?)
    }

    /// Get a post with author and counts.
    pub async fn get(&self, id: i64) -> Result<PostWithMeta, ServiceError> {
        self.post_repo
            .get_with_meta(id)
            .await
            .context("Failed to load post")?
            .ok_or_else(|| ServiceError::not_found("Post not found"))
    }

    /// Search/filter/paginate posts.
    pub async fn search(&self, query: &PostQuery) -> anyhow::Result<(Vec<PostWithMeta>, i64)> {
        self.post_repo.search(query).await
    }

    /// Posts authored by the caller.
    pub async fn mine(
        &self,
        author: &User,
        page: i64,
        per_page: i64,
    ) -> anyhow::Result<(Vec<PostWithMeta>, i64)> {
        self.post_repo.list_by_author(author.id, page, per_page).await
    }

    /// The caller's feed: posts from followed users, newest first.
    pub async fn feed(
        &self,
        viewer: &User,
        page: i64,
        per_page: i64,
    ) -> anyhow::Result<(Vec<PostWithMeta>, i64)> {
        self.post_repo.feed(viewer.id, page, per_page).await
    }

    /// Update a post. Author only.
    pub async fn update(
        &self,
        id: i64,
        caller: &User,
        title: &str,
        content: &str,
    ) -> Result<Post, ServiceError> {
        let (title, content) = validate_post(title, content)?;

        let mut post = self.load(id).await?;
        if post.author_id != caller.id {
            return Err(ServiceError::forbidden("Only the author can edit a post"));
        }

        post.title = title;
        post.content = content;

        Ok(self
            .post_repo
            .update(&post)
            .await
            .context("Failed to update post")?)
    }

    /// Delete a post. Author or admin.
    pub async fn delete(&self, id: i64, caller: &User) -> Result<(), ServiceError> {
        let post = self.load(id).await?;
        if !caller.can_edit(post.author_id) {
            return Err(ServiceError::forbidden(
                "Only the author or an admin can delete a post",
            ));
        }

        self.post_repo
            .delete(id)
            .await
            .context("Failed to delete post")?;
        Ok(())
    }

    /// Total posts
    pub async fn count(&self) -> anyhow::Result<i64> {
        self.post_repo.count().await
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Comment on a post. Notifies the post author.
    pub async fn comment(
        &self,
        post_id: i64,
        author: &User,
        content: &str,
    ) -> Result<Comment, ServiceError> {
        let content = validate_comment(content)?;
        let post = self.load(post_id).await?;

        let comment = self
            .comment_repo
            .create(&Comment::new(post_id, author.id, content))
            .await
            .context("Failed to create comment")?;

        if post.author_id != author.id {
            self.notification_repo
                .create(&Notification::new(
                    post.author_id,
                    author.id,
                    verbs::COMMENTED,
                    Some(NotificationTarget::Post(post_id)),
                ))
                .await
                .context("Failed to create comment notification")?;
        }

        Ok(comment)
    }

    /// Comments on a post, oldest first.
    pub async fn comments(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, ServiceError> {
        self.load(post_id).await?;
        Ok(self
            .comment_repo
            .list_for_post(post_id)
            .await
            .context("Failed to list comments")?)
    }

    /// Edit a comment. Author only.
    pub async fn update_comment(
        &self,
        id: i64,
        caller: &User,
        content: &str,
    ) -> Result<Comment, ServiceError> {
        let content = validate_comment(content)?;

        let mut comment = self
            .comment_repo
            .get_by_id(id)
            .await
            .context("Failed to load comment")?
            .ok_or_else(|| ServiceError::not_found("Comment not found"))?;

        if comment.author_id != caller.id {
            return Err(ServiceError::forbidden(
                "Only the author can edit a comment",
            ));
        }

        comment.content = content;
        Ok(self
            .comment_repo
            .update(&comment)
            .await
            .context("Failed to update comment")?)
    }

    /// Delete a comment. Author or admin.
    pub async fn delete_comment(&self, id: i64, caller: &User) -> Result<(), ServiceError> {
        let comment = self
            .comment_repo
            .get_by_id(id)
            .await
            .context("Failed to load comment")?
            .ok_or_else(|| ServiceError::not_found("Comment not found"))?;

        if !caller.can_edit(comment.author_id) {
            return Err(ServiceError::forbidden(
                "Only the author or an admin can delete a comment",
            ));
        }

        self.comment_repo
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    // ========================================================================
    // Likes
    // ========================================================================

    /// Like a post. A repeat like is a conflict. First likes notify the
    /// post's author.
    pub async fn like(&self, post_id: i64, user: &User) -> Result<i64, ServiceError> {
        let post = self.load(post_id).await?;

        let newly_liked = self
            .like_repo
            .add(post_id, user.id)
            .await
            .context("Failed to like post")?;

        if !newly_liked {
            return Err(ServiceError::conflict("You have already liked this post"));
        }

        if post.author_id != user.id {
            self.notification_repo
                .create(&Notification::new(
                    post.author_id,
                    user.id,
                    verbs::LIKED_POST,
                    Some(NotificationTarget::Post(post_id)),
                ))
                .await
                .context("Failed to create like notification")?;
        }

        Ok(self
            .like_repo
            .count_for_post(post_id)
            .await
            .context("Failed to count likes")?)
    }

    /// Remove a like. Idempotent.
    pub async fn unlike(&self, post_id: i64, user: &User) -> Result<i64, ServiceError> {
        self.load(post_id).await?;

        self.like_repo
            .remove(post_id, user.id)
            .await
            .context("Failed to unlike post")?;

        Ok(self
            .like_repo
            .count_for_post(post_id)
            .await
            .context("Failed to count likes")?)
    }

    /// Users who liked a post.
    pub async fn likers(&self, post_id: i64) -> Result<Vec<User>, ServiceError> {
        self.load(post_id).await?;
        Ok(self
            .like_repo
            .users_for_post(post_id)
            .await
            .context("Failed to list likers")?)
    }

    /// Whether the user has liked the post.
    pub async fn has_liked(&self, post_id: i64, user_id: i64) -> anyhow::Result<bool> {
        self.like_repo.exists(post_id, user_id).await
    }

    async fn load(&self, id: i64) -> Result<Post, ServiceError> {
        self.post_repo
            .get_by_id(id)
            .await
            .context("Failed to load post")?
            .ok_or_else(|| ServiceError::not_found("Post not found"))
    }
}

fn validate_post(title: &str, content: &str) -> Result<(String, String), ServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::validation("Post title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ServiceError::validation(format!(
            "Post title cannot exceed {} characters",
            MAX_TITLE_LENGTH
        )));
    }

    let content = content.trim();
    if content.is_empty() {
        return Err(ServiceError::validation("Post content cannot be empty"));
    }

    Ok((title.to_string(), content.to_string()))
}

fn validate_comment(content: &str) -> Result<String, ServiceError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ServiceError::validation("Comment content cannot be empty"));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(ServiceError::validation(format!(
            "Comment content cannot exceed {} characters",
            MAX_COMMENT_LENGTH
        )));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        FollowRepository, SqlxCommentRepository, SqlxFollowRepository, SqlxLikeRepository,
        SqlxNotificationRepository, SqlxPostRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;

    struct Fixture {
        service: PostService,
        notifications: Arc<SqlxNotificationRepository>,
        follows: SqlxFollowRepository,
        alice: User,
        bob: User,
        admin: User,
    }

    async fn setup() -> Fixture {
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
        let admin = users
            .create(&User::new(
                "admin".into(),
                "admin@example.com".into(),
                "hash".into(),
                UserRole::Admin,
            ))
            .await
            .expect("admin");

        let notifications = Arc::new(SqlxNotificationRepository::new(pool.clone()));
        let service = PostService::new(
            Arc::new(SqlxPostRepository::new(pool.clone())),
            Arc::new(SqlxCommentRepository::new(pool.clone())),
            Arc::new(SqlxLikeRepository::new(pool.clone())),
            notifications.clone(),
        );

        Fixture {
            service,
            notifications,
            follows: SqlxFollowRepository::new(pool),
            alice,
            bob,
            admin,
        }
    }

    #[tokio::test]
    async fn test_create_post_trims_input() {
        let f = setup().await;

        let post = f
            .service
            .create(&f.alice, "  Hello  ", "  world  ")
            .await
            .expect("create");

        assert_eq!(post.title, "Hello");
        assert_eq!(post.content, "world");
    }

    #[tokio::test]
    async fn test_post_validation() {
        let f = setup().await;

        assert!(matches!(
            f.service.create(&f.alice, "   ", "content").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            f.service.create(&f.alice, "title", "").await,
            Err(ServiceError::Validation(_))
        ));
        let long_title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert!(matches!(
            f.service.create(&f.alice, &long_title, "content").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_only_author_edits_admin_deletes() {
        let f = setup().await;
        let post = f
            .service
            .create(&f.alice, "Title", "content")
            .await
            .expect("create");

        // Bob can't edit or delete
        assert!(matches!(
            f.service.update(post.id, &f.bob, "New", "new").await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete(post.id, &f.bob).await,
            Err(ServiceError::Forbidden(_))
        ));

        // Admin can't edit (not the author) but can delete
        assert!(matches!(
            f.service.update(post.id, &f.admin, "New", "new").await,
            Err(ServiceError::Forbidden(_))
        ));
        f.service.delete(post.id, &f.admin).await.expect("delete");
    }

    #[tokio::test]
    async fn test_comment_notifies_post_author() {
        let f = setup().await;
        let post = f
            .service
            .create(&f.alice, "Title", "content")
            .await
            .expect("create");

        f.service
            .comment(post.id, &f.bob, "Nice post")
            .await
            .expect("comment");

        assert_eq!(
            f.notifications.unread_count(f.alice.id).await.expect("count"),
            1
        );

        // Self-comments do not notify
        f.service
            .comment(post.id, &f.alice, "Thanks me")
            .await
            .expect("comment");
        assert_eq!(
            f.notifications.unread_count(f.alice.id).await.expect("count"),
            1
        );
    }

    #[tokio::test]
    async fn test_comment_length_limit() {
        let f = setup().await;
        let post = f
            .service
            .create(&f.alice, "Title", "content")
            .await
            .expect("create");

        let too_long = "x".repeat(MAX_COMMENT_LENGTH + 1);
        let result = f.service.comment(post.id, &f.bob, &too_long).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));

        // Exactly at the limit is fine
        let at_limit = "x".repeat(MAX_COMMENT_LENGTH);
        f.service
            .comment(post.id, &f.bob, &at_limit)
            .await
            .expect("comment");
    }

    #[tokio::test]
    async fn test_like_conflict_and_unlike_idempotence() {
        let f = setup().await;
        let post = f
            .service
            .create(&f.alice, "Title", "content")
            .await
            .expect("create");

        let count = f.service.like(post.id, &f.bob).await.expect("like");
        assert_eq!(count, 1);

        // Second like is a conflict
        assert!(matches!(
            f.service.like(post.id, &f.bob).await,
            Err(ServiceError::Conflict(_))
        ));

        // Like notified alice exactly once
        assert_eq!(
            f.notifications.unread_count(f.alice.id).await.expect("count"),
            1
        );

        let count = f.service.unlike(post.id, &f.bob).await.expect("unlike");
        assert_eq!(count, 0);
        // Unliking again is fine
        f.service.unlike(post.id, &f.bob).await.expect("unlike again");
    }

    #[tokio::test]
    async fn test_likers_listing() {
        let f = setup().await;
        let post = f
            .service
            .create(&f.alice, "Title", "content")
            .await
            .expect("create");
        f.service.like(post.id, &f.bob).await.expect("like");

        let likers = f.service.likers(post.id).await.expect("likers");

        assert_eq!(likers.len(), 1);
        assert_eq!(likers[0].username, "bob");
    }

    #[tokio::test]
    async fn test_feed_follows_only() {
        let f = setup().await;
        f.service
            .create(&f.alice, "From alice", "x")
            .await
            .expect("create");
        f.service
            .create(&f.bob, "From bob", "y")
            .await
            .expect("create");

        f.follows.add(f.alice.id, f.bob.id).await.expect("follow");

        let (posts, total) = f.service.feed(&f.alice, 1, 10).await.expect("feed");

        assert_eq!(total, 1);
        assert_eq!(posts[0].title, "From bob");
    }

    #[tokio::test]
    async fn test_counts_in_meta() {
        let f = setup().await;
        let post = f
            .service
            .create(&f.alice, "Title", "content")
            .await
            .expect("create");
        f.service
            .comment(post.id, &f.bob, "one")
            .await
            .expect("comment");
        f.service.like(post.id, &f.bob).await.expect("like");

        let meta = f.service.get(post.id).await.expect("get");

        assert_eq!(meta.comment_count, 1);
        assert_eq!(meta.like_count, 1);
        assert_eq!(meta.author_username, "alice");
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let f = setup().await;

        let result = f.service.comment(999, &f.bob, "into the void").await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
