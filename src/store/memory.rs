// src/store/memory.rs

//! In-process store. A single mutex serializes every operation, so the
//! uniqueness checks below cannot race with the inserts they guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::Store;
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

struct Table<T> {
    next_id: i64,
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Clone)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<i64>,
    genre_ids: Vec<i64>,
}

#[derive(Clone)]
struct ReviewRow {
    id: i64,
    title_id: i64,
    author_id: i64,
    text: String,
    score: i32,
    pub_date: DateTime<Utc>,
}

#[derive(Clone)]
struct CommentRow {
    id: i64,
    title_id: i64,
    review_id: i64,
    author_id: i64,
    text: String,
    pub_date: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    categories: Table<Category>,
    genres: Table<Genre>,
    titles: Table<TitleRow>,
    reviews: Table<ReviewRow>,
    comments: Table<CommentRow>,
    users: Table<User>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

impl Tables {
    fn username_of(&self, user_id: i64) -> String {
        self.users
            .rows
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn title_view(&self, row: &TitleRow) -> TitleResponse {
        let scores: Vec<i32> = self
            .reviews
            .rows
            .iter()
            .filter(|r| r.title_id == row.id)
            .map(|r| r.score)
            .collect();
        let rating = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<i32>() / scores.len() as i32)
        };

        let mut genre: Vec<Genre> = self
            .genres
            .rows
            .iter()
            .filter(|g| row.genre_ids.contains(&g.id))
            .cloned()
            .collect();
        genre.sort_by(|a, b| a.name.cmp(&b.name));

        TitleResponse {
            id: row.id,
            name: row.name.clone(),
            year: row.year,
            rating,
            description: row.description.clone(),
            genre,
            category: row
                .category_id
                .and_then(|id| self.categories.rows.iter().find(|c| c.id == id).cloned()),
        }
    }

    fn review_view(&self, row: &ReviewRow) -> Review {
        Review {
            id: row.id,
            title_id: row.title_id,
            text: row.text.clone(),
            author_id: row.author_id,
            author: self.username_of(row.author_id),
            score: row.score,
            pub_date: row.pub_date,
        }
    }

    fn comment_view(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            title_id: row.title_id,
            review_id: row.review_id,
            text: row.text.clone(),
            author_id: row.author_id,
            author: self.username_of(row.author_id),
            pub_date: row.pub_date,
        }
    }

    /// Turns the slugs of a write request into row ids.
    fn resolve_refs(&self, input: &CreateTitleRequest) -> Result<(Option<i64>, Vec<i64>), AppError> {
        let category_id = match &input.category {
            Some(slug) => Some(
                self.categories
                    .rows
                    .iter()
                    .find(|c| &c.slug == slug)
                    .map(|c| c.id)
                    .ok_or_else(|| {
                        AppError::BadRequest(format!("Category '{}' does not exist", slug))
                    })?,
            ),
            None => None,
        };

        let mut genre_ids = Vec::with_capacity(input.genre.len());
        for slug in &input.genre {
            let id = self
                .genres
                .rows
                .iter()
                .find(|g| &g.slug == slug)
                .map(|g| g.id)
                .ok_or_else(|| AppError::BadRequest(format!("Genre '{}' does not exist", slug)))?;
            if !genre_ids.contains(&id) {
                genre_ids.push(id);
            }
        }

        Ok((category_id, genre_ids))
    }

    fn check_user_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<i64>,
    ) -> Result<(), AppError> {
        for user in self.users.rows.iter().filter(|u| Some(u.id) != except) {
            if username == Some(user.username.as_str()) {
                return Err(AppError::Conflict(
                    "A user with that username already exists".to_string(),
                ));
            }
            if email == Some(user.email.as_str()) {
                return Err(AppError::Conflict(
                    "A user with that email already exists".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn remove_reviews(&mut self, doomed: impl Fn(&ReviewRow) -> bool) {
        let review_ids: Vec<i64> = self
            .reviews
            .rows
            .iter()
            .filter(|&r| doomed(r))
            .map(|r| r.id)
            .collect();
        self.reviews.rows.retain(|r| !review_ids.contains(&r.id));
        self.comments
            .rows
            .retain(|c| !review_ids.contains(&c.review_id));
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_categories(
        &self,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Category>, AppError> {
        let tables = self.tables.lock().await;
        let mut found: Vec<Category> = tables
            .categories
            .rows
            .iter()
            .filter(|c| matches(&c.name, search))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page.slice(&found))
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<Category, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.categories.rows.iter().any(|c| c.slug == slug) {
            return Err(AppError::Conflict(format!(
                "Category with slug '{}' already exists",
                slug
            )));
        }
        let category = Category {
            id: tables.categories.allocate(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        tables.categories.rows.push(category.clone());
        Ok(category)
    }

    async fn delete_category(&self, slug: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(pos) = tables.categories.rows.iter().position(|c| c.slug == slug) else {
            return Ok(false);
        };
        let removed = tables.categories.rows.remove(pos);
        for title in tables
            .titles
            .rows
            .iter_mut()
            .filter(|t| t.category_id == Some(removed.id))
        {
            title.category_id = None;
        }
        Ok(true)
    }

    async fn list_genres(
        &self,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Genre>, AppError> {
        let tables = self.tables.lock().await;
        let mut found: Vec<Genre> = tables
            .genres
            .rows
            .iter()
            .filter(|g| matches(&g.name, search))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page.slice(&found))
    }

    async fn create_genre(&self, name: &str, slug: &str) -> Result<Genre, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.genres.rows.iter().any(|g| g.slug == slug) {
            return Err(AppError::Conflict(format!(
                "Genre with slug '{}' already exists",
                slug
            )));
        }
        let genre = Genre {
            id: tables.genres.allocate(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        tables.genres.rows.push(genre.clone());
        Ok(genre)
    }

    async fn delete_genre(&self, slug: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(pos) = tables.genres.rows.iter().position(|g| g.slug == slug) else {
            return Ok(false);
        };
        let removed = tables.genres.rows.remove(pos);
        for title in tables.titles.rows.iter_mut() {
            title.genre_ids.retain(|id| *id != removed.id);
        }
        Ok(true)
    }

    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageParams,
    ) -> Result<Page<TitleResponse>, AppError> {
        let tables = self.tables.lock().await;
        let found: Vec<TitleResponse> = tables
            .titles
            .rows
            .iter()
            .map(|row| tables.title_view(row))
            .filter(|t| matches(&t.name, filter.name.as_deref()))
            .filter(|t| filter.year.is_none_or(|y| t.year == y))
            .filter(|t| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|slug| t.category.as_ref().is_some_and(|c| c.slug == slug))
            })
            .filter(|t| {
                filter
                    .genre
                    .as_deref()
                    .is_none_or(|slug| t.genre.iter().any(|g| g.slug == slug))
            })
            .collect();
        Ok(page.slice(&found))
    }

    async fn get_title(&self, id: i64) -> Result<Option<TitleResponse>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .titles
            .rows
            .iter()
            .find(|t| t.id == id)
            .map(|row| tables.title_view(row)))
    }

    async fn create_title(&self, input: &CreateTitleRequest) -> Result<TitleResponse, AppError> {
        let mut tables = self.tables.lock().await;
        let (category_id, genre_ids) = tables.resolve_refs(input)?;
        let row = TitleRow {
            id: tables.titles.allocate(),
            name: input.name.clone(),
            year: input.year,
            description: input.description.clone(),
            category_id,
            genre_ids,
        };
        tables.titles.rows.push(row.clone());
        Ok(tables.title_view(&row))
    }

    async fn update_title(
        &self,
        id: i64,
        input: &CreateTitleRequest,
    ) -> Result<Option<TitleResponse>, AppError> {
        let mut tables = self.tables.lock().await;
        let (category_id, genre_ids) = tables.resolve_refs(input)?;
        let Some(row) = tables.titles.rows.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        row.name = input.name.clone();
        row.year = input.year;
        row.description = input.description.clone();
        row.category_id = category_id;
        row.genre_ids = genre_ids;
        let row = row.clone();
        Ok(Some(tables.title_view(&row)))
    }

    async fn delete_title(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.titles.rows.len();
        tables.titles.rows.retain(|t| t.id != id);
        if tables.titles.rows.len() == before {
            return Ok(false);
        }
        tables.remove_reviews(|r| r.title_id == id);
        tables.comments.rows.retain(|c| c.title_id != id);
        Ok(true)
    }

    async fn list_reviews(
        &self,
        title_id: i64,
        page: PageParams,
    ) -> Result<Page<Review>, AppError> {
        let tables = self.tables.lock().await;
        let found: Vec<Review> = tables
            .reviews
            .rows
            .iter()
            .filter(|r| r.title_id == title_id)
            .map(|r| tables.review_view(r))
            .collect();
        Ok(page.slice(&found))
    }

    async fn get_review(&self, title_id: i64, review_id: i64) -> Result<Option<Review>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reviews
            .rows
            .iter()
            .find(|r| r.id == review_id && r.title_id == title_id)
            .map(|r| tables.review_view(r)))
    }

    async fn create_review(
        &self,
        title_id: i64,
        author_id: i64,
        text: &str,
        score: i32,
    ) -> Result<Review, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.titles.rows.iter().any(|t| t.id == title_id) {
            return Err(AppError::NotFound("Title not found".to_string()));
        }
        if tables
            .reviews
            .rows
            .iter()
            .any(|r| r.title_id == title_id && r.author_id == author_id)
        {
            return Err(AppError::Conflict(
                "You have already reviewed this title".to_string(),
            ));
        }
        let row = ReviewRow {
            id: tables.reviews.allocate(),
            title_id,
            author_id,
            text: text.to_string(),
            score,
            pub_date: Utc::now(),
        };
        tables.reviews.rows.push(row.clone());
        Ok(tables.review_view(&row))
    }

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<&str>,
        score: Option<i32>,
    ) -> Result<Option<Review>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables.reviews.rows.iter_mut().find(|r| r.id == review_id) else {
            return Ok(None);
        };
        if let Some(text) = text {
            row.text = text.to_string();
        }
        if let Some(score) = score {
            row.score = score;
        }
        let row = row.clone();
        Ok(Some(tables.review_view(&row)))
    }

    async fn delete_review(&self, review_id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let existed = tables.reviews.rows.iter().any(|r| r.id == review_id);
        tables.remove_reviews(|r| r.id == review_id);
        Ok(existed)
    }

    async fn list_comments(
        &self,
        review_id: i64,
        page: PageParams,
    ) -> Result<Page<Comment>, AppError> {
        let tables = self.tables.lock().await;
        let found: Vec<Comment> = tables
            .comments
            .rows
            .iter()
            .filter(|c| c.review_id == review_id)
            .map(|c| tables.comment_view(c))
            .collect();
        Ok(page.slice(&found))
    }

    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .comments
            .rows
            .iter()
            .find(|c| c.id == comment_id && c.review_id == review_id)
            .map(|c| tables.comment_view(c)))
    }

    async fn create_comment(
        &self,
        title_id: i64,
        review_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables
            .reviews
            .rows
            .iter()
            .any(|r| r.id == review_id && r.title_id == title_id)
        {
            return Err(AppError::NotFound("Review not found".to_string()));
        }
        let row = CommentRow {
            id: tables.comments.allocate(),
            title_id,
            review_id,
            author_id,
            text: text.to_string(),
            pub_date: Utc::now(),
        };
        tables.comments.rows.push(row.clone());
        Ok(tables.comment_view(&row))
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        text: Option<&str>,
    ) -> Result<Option<Comment>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables.comments.rows.iter_mut().find(|c| c.id == comment_id) else {
            return Ok(None);
        };
        if let Some(text) = text {
            row.text = text.to_string();
        }
        let row = row.clone();
        Ok(Some(tables.comment_view(&row)))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.comments.rows.len();
        tables.comments.rows.retain(|c| c.id != comment_id);
        Ok(tables.comments.rows.len() != before)
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<User>, AppError> {
        let tables = self.tables.lock().await;
        let found: Vec<User> = tables
            .users
            .rows
            .iter()
            .filter(|u| matches(&u.username, search))
            .cloned()
            .collect();
        Ok(page.slice(&found))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .rows
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user(&self, username: &str, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .rows
            .iter()
            .find(|u| u.username == username && u.email == email)
            .cloned())
    }

    async fn create_user(&self, new: &NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;
        tables.check_user_unique(Some(&new.username), Some(&new.email), None)?;
        let user = User {
            id: tables.users.allocate(),
            username: new.username.clone(),
            email: new.email.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            bio: new.bio.clone(),
            role: new.role,
            is_superuser: new.is_superuser,
            last_login: None,
            date_joined: Utc::now(),
        };
        tables.users.rows.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.lock().await;
        tables.check_user_unique(changes.username.as_deref(), changes.email.as_deref(), Some(id))?;
        let Some(user) = tables.users.rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(first_name) = &changes.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(bio) = &changes.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, username: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(pos) = tables.users.rows.iter().position(|u| u.username == username) else {
            return Ok(false);
        };
        let removed = tables.users.rows.remove(pos);
        tables.remove_reviews(|r| r.author_id == removed.id);
        tables.comments.rows.retain(|c| c.author_id != removed.id);
        Ok(true)
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.rows.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@x.com", name),
            role: Role::User,
            ..NewUser::default()
        }
    }

    fn title(name: &str, category: Option<&str>, genre: &[&str]) -> CreateTitleRequest {
        CreateTitleRequest {
            name: name.to_string(),
            year: 2000,
            description: None,
            category: category.map(str::to_string),
            genre: genre.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn slugs_are_unique() {
        let store = MemoryStore::new();
        store.create_category("Film", "film").await.unwrap();
        let err = store.create_category("Movies", "film").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_category_nullifies_titles() {
        let store = MemoryStore::new();
        store.create_category("Film", "film").await.unwrap();
        let t = store.create_title(&title("Solaris", Some("film"), &[])).await.unwrap();
        assert!(store.delete_category("film").await.unwrap());
        let after = store.get_title(t.id).await.unwrap().unwrap();
        assert!(after.category.is_none());
    }

    #[tokio::test]
    async fn deleting_title_cascades() {
        let store = MemoryStore::new();
        let author = store.create_user(&new_user("ann")).await.unwrap();
        let t = store.create_title(&title("Solaris", None, &[])).await.unwrap();
        let r = store.create_review(t.id, author.id, "good", 8).await.unwrap();
        store.create_comment(t.id, r.id, author.id, "agreed").await.unwrap();

        assert!(store.delete_title(t.id).await.unwrap());
        assert!(store.get_review(t.id, r.id).await.unwrap().is_none());
        let comments = store.list_comments(r.id, PageParams::default()).await.unwrap();
        assert_eq!(comments.count, 0);
    }

    #[tokio::test]
    async fn one_review_per_author_and_rating_truncates() {
        let store = MemoryStore::new();
        let a = store.create_user(&new_user("ann")).await.unwrap();
        let b = store.create_user(&new_user("ben")).await.unwrap();
        let t = store.create_title(&title("Solaris", None, &[])).await.unwrap();

        store.create_review(t.id, a.id, "good", 8).await.unwrap();
        let err = store.create_review(t.id, a.id, "again", 3).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        store.create_review(t.id, b.id, "fine", 7).await.unwrap();

        let rated = store.get_title(t.id).await.unwrap().unwrap();
        assert_eq!(rated.rating, Some(7));
    }

    #[tokio::test]
    async fn unknown_slugs_are_rejected() {
        let store = MemoryStore::new();
        let err = store
            .create_title(&title("Solaris", None, &["drama"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn title_filters_combine() {
        let store = MemoryStore::new();
        store.create_category("Film", "film").await.unwrap();
        store.create_genre("Drama", "drama").await.unwrap();
        store.create_title(&title("Solaris", Some("film"), &["drama"])).await.unwrap();
        store.create_title(&title("Stalker", Some("film"), &[])).await.unwrap();

        let by_genre = TitleFilter {
            genre: Some("drama".to_string()),
            ..TitleFilter::default()
        };
        let page = store.list_titles(&by_genre, PageParams::default()).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].name, "Solaris");

        let by_name = TitleFilter {
            name: Some("ALK".to_string()),
            category: Some("film".to_string()),
            ..TitleFilter::default()
        };
        let page = store.list_titles(&by_name, PageParams::default()).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].name, "Stalker");
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_content() {
        let store = MemoryStore::new();
        let a = store.create_user(&new_user("ann")).await.unwrap();
        let t = store.create_title(&title("Solaris", None, &[])).await.unwrap();
        store.create_review(t.id, a.id, "good", 8).await.unwrap();

        assert!(store.delete_user("ann").await.unwrap());
        let reviews = store.list_reviews(t.id, PageParams::default()).await.unwrap();
        assert_eq!(reviews.count, 0);
    }

    #[tokio::test]
    async fn user_email_is_unique_on_update() {
        let store = MemoryStore::new();
        store.create_user(&new_user("ann")).await.unwrap();
        let ben = store.create_user(&new_user("ben")).await.unwrap();
        let changes = UserChanges {
            email: Some("ann@x.com".to_string()),
            ..UserChanges::default()
        };
        let err = store.update_user(ben.id, &changes).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
