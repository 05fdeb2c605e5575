// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validation::validate_slug;

/// Represents the 'categories' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Category {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    /// Unique URL-safe identifier.
    pub slug: String,
}

/// DTO for creating a new category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 256, message = "Name must be between 1 and 256 characters"))]
    pub name: String,
    #[validate(
        length(min = 1, max = 50, message = "Slug must be between 1 and 50 characters"),
        custom(function = validate_slug)
    )]
    pub slug: String,
}

/// Query parameters shared by the category and genre listings.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive substring of the name (or username for users).
    pub search: Option<String>,
}
