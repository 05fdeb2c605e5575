// src/store/mod.rs

//! Persistence boundary. Handlers only talk to [`Store`]; uniqueness,
//! cascading deletes and the rating aggregate are the implementation's job.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        category::Category,
        comment::Comment,
        genre::Genre,
        review::Review,
        title::{CreateTitleRequest, TitleFilter, TitleResponse},
        user::{NewUser, User, UserChanges},
    },
    utils::pagination::{Page, PageParams},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type DynStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    // Categories

    async fn list_categories(
        &self,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Category>, AppError>;

    /// Fails with `Conflict` when the slug is taken.
    async fn create_category(&self, name: &str, slug: &str) -> Result<Category, AppError>;

    /// Titles in the category keep existing with no category.
    /// Returns false when no category has that slug.
    async fn delete_category(&self, slug: &str) -> Result<bool, AppError>;

    // Genres

    async fn list_genres(
        &self,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Genre>, AppError>;

    async fn create_genre(&self, name: &str, slug: &str) -> Result<Genre, AppError>;

    async fn delete_genre(&self, slug: &str) -> Result<bool, AppError>;

    // Titles

    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageParams,
    ) -> Result<Page<TitleResponse>, AppError>;

    async fn get_title(&self, id: i64) -> Result<Option<TitleResponse>, AppError>;

    /// Category and genre slugs must name existing rows, else `BadRequest`.
    async fn create_title(&self, input: &CreateTitleRequest) -> Result<TitleResponse, AppError>;

    /// Replaces every field of the title. `None` when the title does not exist.
    async fn update_title(
        &self,
        id: i64,
        input: &CreateTitleRequest,
    ) -> Result<Option<TitleResponse>, AppError>;

    /// Cascades to the title's reviews and comments.
    async fn delete_title(&self, id: i64) -> Result<bool, AppError>;

    // Reviews

    async fn list_reviews(&self, title_id: i64, page: PageParams)
    -> Result<Page<Review>, AppError>;

    async fn get_review(&self, title_id: i64, review_id: i64) -> Result<Option<Review>, AppError>;

    /// Fails with `Conflict` when the author already reviewed the title.
    async fn create_review(
        &self,
        title_id: i64,
        author_id: i64,
        text: &str,
        score: i32,
    ) -> Result<Review, AppError>;

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<&str>,
        score: Option<i32>,
    ) -> Result<Option<Review>, AppError>;

    /// Cascades to the review's comments.
    async fn delete_review(&self, review_id: i64) -> Result<bool, AppError>;

    // Comments

    async fn list_comments(
        &self,
        review_id: i64,
        page: PageParams,
    ) -> Result<Page<Comment>, AppError>;

    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, AppError>;

    async fn create_comment(
        &self,
        title_id: i64,
        review_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, AppError>;

    async fn update_comment(
        &self,
        comment_id: i64,
        text: Option<&str>,
    ) -> Result<Option<Comment>, AppError>;

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError>;

    // Users

    async fn list_users(&self, search: Option<&str>, page: PageParams)
    -> Result<Page<User>, AppError>;

    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Exact match on both username and email.
    async fn find_user(&self, username: &str, email: &str) -> Result<Option<User>, AppError>;

    /// Fails with `Conflict` when the username or email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError>;

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>, AppError>;

    /// Cascades to the user's reviews and comments.
    async fn delete_user(&self, username: &str) -> Result<bool, AppError>;

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError>;
}
