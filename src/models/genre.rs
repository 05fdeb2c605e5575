// src/models/genre.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validation::validate_slug;

/// Represents the 'genres' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Genre {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// DTO for creating a new genre.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGenreRequest {
    #[validate(length(min = 1, max = 256, message = "Name must be between 1 and 256 characters"))]
    pub name: String,
    #[validate(
        length(min = 1, max = 50, message = "Slug must be between 1 and 50 characters"),
        custom(function = validate_slug)
    )]
    pub slug: String,
}
