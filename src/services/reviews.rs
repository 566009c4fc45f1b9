//! Review service
//!
//! One review per reader per book. Creating a second review for the same
//! book is a conflict; editing goes through the existing review. Authors of
//! a book's catalog entry get notified about new reviews.

use crate::db::repositories::review::ReviewWithReviewer;
use crate::db::repositories::{BookRepository, NotificationRepository, ReviewRepository};
use crate::models::notification::{verbs, Notification, NotificationTarget};
use crate::models::{Review, User};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

/// Review service
pub struct ReviewService {
    review_repo: Arc<dyn ReviewRepository>,
    book_repo: Arc<dyn BookRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
}

impl ReviewService {
    pub fn new(
        review_repo: Arc<dyn ReviewRepository>,
        book_repo: Arc<dyn BookRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            review_repo,
            book_repo,
            notification_repo,
        }
    }

    /// Create a review for a book.
    pub async fn create(
        &self,
        book_id: i64,
        reviewer: &User,
        rating: i32,
        body: &str,
    ) -> Result<Review, ServiceError> {
        let body = validate_review(rating, body)?;

        let book = self
            .book_repo
            .get_by_id(book_id)
            .await
            .context("Failed to load book")?
            .ok_or_else(|| ServiceError::not_found("Book not found"))?;

        if self
            .review_repo
            .get_for_book_and_reviewer(book_id, reviewer.id)
            .await
            .context("Failed to check existing review")?
            .is_some()
        {
            return Err(ServiceError::conflict(
                "You have already reviewed this book",
            ));
        }

        let review = self
            .review_repo
            .create(&Review::new(book_id, reviewer.id, rating, body))
            .await
            .context("Failed to create review")?;

        // Tell whoever added the book, unless they reviewed it themselves
        if book.added_by != reviewer.id {
            self.notification_repo
                .create(&Notification::new(
                    book.added_by,
                    reviewer.id,
                    verbs::REVIEWED_BOOK,
                    Some(NotificationTarget::Book(book_id)),
                ))
                .await
                .context("Failed to create review notification")?;
        }

        Ok(review)
    }

    /// Reviews for a book, newest first.
    pub async fn list_for_book(&self, book_id: i64) -> Result<Vec<ReviewWithReviewer>, ServiceError> {
        self.book_repo
            .get_by_id(book_id)
            .await
            .context("Failed to load book")?
            .ok_or_else(|| ServiceError::not_found("Book not found"))?;

        Ok(self
            .review_repo
            .list_for_book(book_id)
            .await
            .context("Failed to list reviews")?)
    }

    /// Update the caller's review.
    pub async fn update(
        &self,
        id: i64,
        caller: &User,
        rating: i32,
        body: &str,
    ) -> Result<Review, ServiceError> {
        let body = validate_review(rating, body)?;

        let mut review = self
            .review_repo
            .get_by_id(id)
            .await
            .context("Failed to load review")?
            .ok_or_else(|| ServiceError::not_found("Review not found"))?;

        if review.reviewer_id != caller.id {
            return Err(ServiceError::forbidden(
                "Only the reviewer can edit a review",
            ));
        }

        review.rating = rating;
        review.body = body;

        Ok(self
            .review_repo
            .update(&review)
            .await
            .context("Failed to update review")?)
    }

    /// Delete a review. The reviewer or an admin may do this.
    pub async fn delete(&self, id: i64, caller: &User) -> Result<(), ServiceError> {
        let review = self
            .review_repo
            .get_by_id(id)
            .await
            .context("Failed to load review")?
            .ok_or_else(|| ServiceError::not_found("Review not found"))?;

        if !caller.can_edit(review.reviewer_id) {
            return Err(ServiceError::forbidden(
                "Only the reviewer or an admin can delete a review",
            ));
        }

        self.review_repo
            .delete(id)
            .await
            .context("Failed to delete review")?;
        Ok(())
    }
}

fn validate_review(rating: i32, body: &str) -> Result<String, ServiceError> {
    if !(1..=5).contains(&rating) {
        return Err(ServiceError::validation("Rating must be between 1 and 5"));
    }

    let body = body.trim();
    if body.is_empty() {
        return Err(ServiceError::validation("Review text cannot be empty"));
    }

    Ok(body.to_string())
}
