//! Reading list service
//!
//! Lists are private by default; a public list is readable by anyone but
//! only ever writable by its owner.

use crate::db::repositories::{BookRepository, ReadingListRepository};
use crate::models::book::BookWithAuthor;
use crate::models::{ReadingList, User};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

/// Input for creating or updating a reading list
#[derive(Debug, Clone)]
pub struct ReadingListInput {
    pub name: String,
    pub description: String,
    pub is_public: bool,
}

/// Reading list service
pub struct ReadingListService {
    list_repo: Arc<dyn ReadingListRepository>,
    book_repo: Arc<dyn BookRepository>,
}

impl ReadingListService {
    pub fn new(
        list_repo: Arc<dyn ReadingListRepository>,
        book_repo: Arc<dyn BookRepository>,
    ) -> Self {
        Self {
            list_repo,
            book_repo,
        }
    }

    /// Create a reading list owned by the caller.
    pub async fn create(
        &self,
        owner: &User,
        input: ReadingListInput,
    ) -> Result<ReadingList, ServiceError> {
        let name = validate_list_name(&input.name)?;

        Ok(self
            .list_repo
            .create(&ReadingList::new(
                owner.id,
                name,
                input.description.trim().to_string(),
                input.is_public,
            ))
            .await
            .context("Failed to create reading list")?)
    }

    /// The caller's own lists.
    pub async fn mine(&self, owner: &User) -> Result<Vec<ReadingList>, ServiceError> {
        Ok(self
            .list_repo
            .list_for_owner(owner.id)
            .await
            .context("Failed to list reading lists")?)
    }

    /// All public lists.
    pub async fn public(&self) -> Result<Vec<ReadingList>, ServiceError> {
        Ok(self
            .list_repo
            .list_public()
            .await
            .context("Failed to list public reading lists")?)
    }

    /// A list with its books, if the viewer may see it.
    pub async fn get(
        &self,
        id: i64,
        viewer: &User,
    ) -> Result<(ReadingList, Vec<BookWithAuthor>), ServiceError> {
        let list = self.load(id).await?;

        if !list.visible_to(viewer.id) && !viewer.is_admin() {
            // Hide the existence of private lists
            return Err(ServiceError::not_found("Reading list not found"));
        }

        let books = self
            .list_repo
            .books(id)
            .await
            .context("Failed to load reading list books")?;

        Ok((list, books))
    }

    /// Update name/description/visibility. Owner only.
    pub async fn update(
        &self,
        id: i64,
        caller: &User,
        input: ReadingListInput,
    ) -> Result<ReadingList, ServiceError> {
        let name = validate_list_name(&input.name)?;
        let mut list = self.load_owned(id, caller).await?;

        list.name = name;
        list.description = input.description.trim().to_string();
        list.is_public = input.is_public;

        Ok(self
            .list_repo
            .update(&list)
            .await
            .context("Failed to update reading list")?)
    }

    /// Delete a list. Owner or admin.
    pub async fn delete(&self, id: i64, caller: &User) -> Result<(), ServiceError> {
        let list = self.load(id).await?;

        if !caller.can_edit(list.owner_id) {
            return Err(ServiceError::forbidden(
                "Only the owner can delete a reading list",
            ));
        }

        self.list_repo
            .delete(id)
            .await
            .context("Failed to delete reading list")?;
        Ok(())
    }

    /// Add a book to the list. Owner only; idempotent.
    pub async fn add_book(
        &self,
        id: i64,
        caller: &User,
        book_id: i64,
    ) -> Result<(), ServiceError> {
        self.load_owned(id, caller).await?;

        self.book_repo
            .get_by_id(book_id)
            .await
            .context("Failed to load book")?
            .ok_or_else(|| ServiceError::not_found("Book not found"))?;

        self.list_repo
            .add_book(id, book_id)
            .await
            .context("Failed to add book to reading list")?;
        Ok(())
    }

    /// Remove a book from the list. Owner only; idempotent.
    pub async fn remove_book(
        &self,
        id: i64,
        caller: &User,
        book_id: i64,
    ) -> Result<(), ServiceError> {
        self.load_owned(id, caller).await?;

        self.list_repo
            .remove_book(id, book_id)
            .await
            .context("Failed to remove book from reading list")?;
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<ReadingList, ServiceError> {
        self.list_repo
            .get_by_id(id)
            .await
            .context("Failed to load reading list")?
            .ok_or_else(|| ServiceError::not_found("Reading list not found"))
    }

    async fn load_owned(&self, id: i64, caller: &User) -> Result<ReadingList, ServiceError> {
        let list = self.load(id).await?;
        if list.owner_id != caller.id {
            return Err(ServiceError::forbidden(
                "Only the owner can modify a reading list",
            ));
        }
        Ok(list)
    }
}

fn validate_list_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("Name is required"));
    }
    if name.chars().count() > 100 {
        return Err(ServiceError::validation(
            "Name must be at most 100 characters",
        ));
    }
    Ok(name.to_string())
}
