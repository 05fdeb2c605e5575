// src/store/postgres.rs

//! PostgreSQL store. Uniqueness, cascades and the score range are enforced by
//! the schema in `migrations/`; this module translates constraint violations
//! into `AppError`s.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

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

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, bio, role, \
                            is_superuser, last_login, date_joined";

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.title_id, r.text, r.author_id, u.username AS author, r.score, r.pub_date
    FROM reviews r
    JOIN users u ON u.id = r.author_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.title_id, c.review_id, c.text, c.author_id, u.username AS author, c.pub_date
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

const TITLE_SELECT: &str = r#"
    SELECT t.id, t.name, t.year, t.description,
           c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
           (SELECT FLOOR(AVG(r.score))::INT4 FROM reviews r WHERE r.title_id = t.id) AS rating
    FROM titles t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

const TITLE_FILTER: &str = r#"
    WHERE ($1::TEXT IS NULL OR t.name ILIKE $1 ESCAPE '\')
      AND ($2::TEXT IS NULL OR c.slug = $2)
      AND ($3::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM title_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE tg.title_id = t.id AND g.slug = $3))
      AND ($4::INT4 IS NULL OR t.year = $4)
"#;

#[derive(Debug, FromRow)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_slug: Option<String>,
    rating: Option<i32>,
}

#[derive(Debug, FromRow)]
struct TitleGenreRow {
    title_id: i64,
    id: i64,
    name: String,
    slug: String,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Loads the genres of every row in one query and assembles read shapes.
    async fn assemble(&self, rows: Vec<TitleRow>) -> Result<Vec<TitleResponse>, AppError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let genre_rows = sqlx::query_as::<_, TitleGenreRow>(
            r#"
            SELECT tg.title_id, g.id, g.name, g.slug
            FROM title_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE tg.title_id = ANY($1)
            ORDER BY g.name
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut genres: HashMap<i64, Vec<Genre>> = HashMap::new();
        for row in genre_rows {
            genres.entry(row.title_id).or_default().push(Genre {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let category = match (row.category_id, row.category_name, row.category_slug) {
                    (Some(id), Some(name), Some(slug)) => Some(Category { id, name, slug }),
                    _ => None,
                };
                TitleResponse {
                    genre: genres.remove(&row.id).unwrap_or_default(),
                    id: row.id,
                    name: row.name,
                    year: row.year,
                    rating: row.rating,
                    description: row.description,
                    category,
                }
            })
            .collect())
    }
}

/// Maps constraint violations raised by the database onto the error taxonomy.
fn write_error(err: sqlx::Error, conflict: impl FnOnce(Option<&str>) -> String) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::Conflict(conflict(db.constraint()));
        }
        if db.is_foreign_key_violation() {
            return AppError::NotFound("Referenced object no longer exists".to_string());
        }
        if db.is_check_violation() {
            return AppError::BadRequest(format!("Constraint violated: {}", db.message()));
        }
    }
    tracing::error!("Store write failed: {:?}", err);
    AppError::from(err)
}

fn user_conflict(constraint: Option<&str>) -> String {
    match constraint {
        Some("users_email_key") => "A user with that email already exists".to_string(),
        _ => "A user with that username already exists".to_string(),
    }
}

/// `%term%` for `ILIKE ... ESCAPE '\'`, with the term's own wildcards escaped
/// so it matches as a literal substring.
fn search_pattern(search: Option<&str>) -> Option<String> {
    search.map(|term| {
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    })
}

/// Turns the slugs of a write request into row ids, inside the caller's transaction.
async fn resolve_refs(
    conn: &mut PgConnection,
    input: &CreateTitleRequest,
) -> Result<(Option<i64>, Vec<i64>), AppError> {
    let category_id = match &input.category {
        Some(slug) => Some(
            sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("Category '{}' does not exist", slug)))?,
        ),
        None => None,
    };

    let found: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, slug FROM genres WHERE slug = ANY($1)")
            .bind(input.genre.as_slice())
            .fetch_all(&mut *conn)
            .await?;

    let mut genre_ids = Vec::with_capacity(input.genre.len());
    for slug in &input.genre {
        let (id, _) = found
            .iter()
            .find(|(_, s)| s == slug)
            .ok_or_else(|| AppError::BadRequest(format!("Genre '{}' does not exist", slug)))?;
        if !genre_ids.contains(id) {
            genre_ids.push(*id);
        }
    }

    Ok((category_id, genre_ids))
}

async fn link_genres(conn: &mut PgConnection, title_id: i64, genre_ids: &[i64]) -> Result<(), AppError> {
    sqlx::query("INSERT INTO title_genres (title_id, genre_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(title_id)
        .bind(genre_ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(e, |_| "Duplicate genre".to_string()))?;
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn list_categories(
        &self,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Category>, AppError> {
        let pattern = search_pattern(search);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories WHERE ($1::TEXT IS NULL OR name ILIKE $1 ESCAPE '\\')",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let results = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug FROM categories
            WHERE ($1::TEXT IS NULL OR name ILIKE $1 ESCAPE '\')
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { count, results })
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, |_| format!("Category with slug '{}' already exists", slug)))
    }

    async fn delete_category(&self, slug: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, |_| String::new()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_genres(
        &self,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Genre>, AppError> {
        let pattern = search_pattern(search);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM genres WHERE ($1::TEXT IS NULL OR name ILIKE $1 ESCAPE '\\')",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let results = sqlx::query_as::<_, Genre>(
            r#"
            SELECT id, name, slug FROM genres
            WHERE ($1::TEXT IS NULL OR name ILIKE $1 ESCAPE '\')
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { count, results })
    }

    async fn create_genre(&self, name: &str, slug: &str) -> Result<Genre, AppError> {
        sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, |_| format!("Genre with slug '{}' already exists", slug)))
    }

    async fn delete_genre(&self, slug: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM genres WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, |_| String::new()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageParams,
    ) -> Result<Page<TitleResponse>, AppError> {
        let name = search_pattern(filter.name.as_deref());

        let count_sql = format!(
            "SELECT COUNT(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id {}",
            TITLE_FILTER
        );
        let count: i64 = sqlx::query_scalar(&count_sql)
            .bind(&name)
            .bind(&filter.category)
            .bind(&filter.genre)
            .bind(filter.year)
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "{} {} ORDER BY t.id LIMIT $5 OFFSET $6",
            TITLE_SELECT, TITLE_FILTER
        );
        let rows = sqlx::query_as::<_, TitleRow>(&list_sql)
            .bind(&name)
            .bind(&filter.category)
            .bind(&filter.genre)
            .bind(filter.year)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            count,
            results: self.assemble(rows).await?,
        })
    }

    async fn get_title(&self, id: i64) -> Result<Option<TitleResponse>, AppError> {
        let sql = format!("{} WHERE t.id = $1", TITLE_SELECT);
        let row = sqlx::query_as::<_, TitleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_title(&self, input: &CreateTitleRequest) -> Result<TitleResponse, AppError> {
        let mut tx = self.pool.begin().await?;
        let (category_id, genre_ids) = resolve_refs(&mut tx, input).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO titles (name, year, description, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(input.year)
        .bind(&input.description)
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, |_| String::new()))?;

        link_genres(&mut tx, id, &genre_ids).await?;
        tx.commit().await?;

        self.get_title(id)
            .await?
            .ok_or_else(|| AppError::InternalServerError(format!("Title {} vanished after insert", id)))
    }

    async fn update_title(
        &self,
        id: i64,
        input: &CreateTitleRequest,
    ) -> Result<Option<TitleResponse>, AppError> {
        let mut tx = self.pool.begin().await?;
        let (category_id, genre_ids) = resolve_refs(&mut tx, input).await?;

        let result = sqlx::query(
            r#"
            UPDATE titles SET name = $1, year = $2, description = $3, category_id = $4
            WHERE id = $5
            "#,
        )
        .bind(&input.name)
        .bind(input.year)
        .bind(&input.description)
        .bind(category_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, |_| String::new()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_genres(&mut tx, id, &genre_ids).await?;
        tx.commit().await?;

        self.get_title(id).await
    }

    async fn delete_title(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, |_| String::new()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reviews(
        &self,
        title_id: i64,
        page: PageParams,
    ) -> Result<Page<Review>, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
            .bind(title_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "{} WHERE r.title_id = $1 ORDER BY r.id LIMIT $2 OFFSET $3",
            REVIEW_SELECT
        );
        let results = sqlx::query_as::<_, Review>(&sql)
            .bind(title_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { count, results })
    }

    async fn get_review(&self, title_id: i64, review_id: i64) -> Result<Option<Review>, AppError> {
        let sql = format!("{} WHERE r.id = $1 AND r.title_id = $2", REVIEW_SELECT);
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(review_id)
            .bind(title_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_review(
        &self,
        title_id: i64,
        author_id: i64,
        text: &str,
        score: i32,
    ) -> Result<Review, AppError> {
        sqlx::query_as::<_, Review>(
            r#"
            WITH inserted AS (
                INSERT INTO reviews (title_id, author_id, text, score)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT i.id, i.title_id, i.text, i.author_id, u.username AS author, i.score, i.pub_date
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(title_id)
        .bind(author_id)
        .bind(text)
        .bind(score)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, |_| "You have already reviewed this title".to_string()))
    }

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<&str>,
        score: Option<i32>,
    ) -> Result<Option<Review>, AppError> {
        sqlx::query_as::<_, Review>(
            r#"
            WITH updated AS (
                UPDATE reviews
                SET text = COALESCE($2, text), score = COALESCE($3, score)
                WHERE id = $1
                RETURNING *
            )
            SELECT d.id, d.title_id, d.text, d.author_id, u.username AS author, d.score, d.pub_date
            FROM updated d
            JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(review_id)
        .bind(text)
        .bind(score)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, |_| String::new()))
    }

    async fn delete_review(&self, review_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, |_| String::new()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(
        &self,
        review_id: i64,
        page: PageParams,
    ) -> Result<Page<Comment>, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = $1")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "{} WHERE c.review_id = $1 ORDER BY c.id LIMIT $2 OFFSET $3",
            COMMENT_SELECT
        );
        let results = sqlx::query_as::<_, Comment>(&sql)
            .bind(review_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { count, results })
    }

    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, AppError> {
        let sql = format!("{} WHERE c.id = $1 AND c.review_id = $2", COMMENT_SELECT);
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(comment_id)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_comment(
        &self,
        title_id: i64,
        review_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (title_id, review_id, author_id, text)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT i.id, i.title_id, i.review_id, i.text, i.author_id, u.username AS author, i.pub_date
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(title_id)
        .bind(review_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, |_| String::new()))
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        text: Option<&str>,
    ) -> Result<Option<Comment>, AppError> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments SET text = COALESCE($2, text)
                WHERE id = $1
                RETURNING *
            )
            SELECT d.id, d.title_id, d.review_id, d.text, d.author_id, u.username AS author, d.pub_date
            FROM updated d
            JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(comment_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, |_| String::new()))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, |_| String::new()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<User>, AppError> {
        let pattern = search_pattern(search);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR username ILIKE $1 ESCAPE '\\')",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE ($1::TEXT IS NULL OR username ILIKE $1 ESCAPE '\')
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
            USER_COLUMNS
        );
        let results = sqlx::query_as::<_, User>(&sql)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { count, results })
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user(&self, username: &str, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE username = $1 AND email = $2",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, new: &NewUser) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, first_name, last_name, bio, role, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.bio)
            .bind(new.role.as_str())
            .bind(new.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, user_conflict))
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>, AppError> {
        if changes.username.is_none()
            && changes.email.is_none()
            && changes.first_name.is_none()
            && changes.last_name.is_none()
            && changes.bio.is_none()
            && changes.role.is_none()
        {
            return self.get_user(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = builder.separated(", ");

        if let Some(username) = &changes.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username.clone());
        }

        if let Some(email) = &changes.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email.clone());
        }

        if let Some(first_name) = &changes.first_name {
            separated.push("first_name = ");
            separated.push_bind_unseparated(first_name.clone());
        }

        if let Some(last_name) = &changes.last_name {
            separated.push("last_name = ");
            separated.push_bind_unseparated(last_name.clone());
        }

        if let Some(bio) = &changes.bio {
            separated.push("bio = ");
            separated.push_bind_unseparated(bio.clone());
        }

        if let Some(role) = changes.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(USER_COLUMNS);

        builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, user_conflict))
    }

    async fn delete_user(&self, username: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, |_| String::new()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_like_wildcards() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("dune")).as_deref(), Some("%dune%"));
        assert_eq!(
            search_pattern(Some(r"50%_a\b")).as_deref(),
            Some(r"%50\%\_a\\b%")
        );
    }
}
