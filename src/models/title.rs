// src/models/title.rs

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::{category::Category, genre::Genre, validation::validate_year};

/// Read shape of a title: nested category/genres and the derived rating.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TitleResponse {
    pub id: i64,
    pub name: String,
    pub year: i32,
    /// Integer part of the average review score, `None` without reviews.
    pub rating: Option<i32>,
    pub description: Option<String>,
    pub genre: Vec<Genre>,
    pub category: Option<Category>,
}

/// Write shape of a title: category and genres referenced by slug.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TitleWriteResponse {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub genre: Vec<String>,
    pub category: Option<String>,
}

impl From<TitleResponse> for TitleWriteResponse {
    fn from(title: TitleResponse) -> Self {
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            description: title.description,
            genre: title.genre.into_iter().map(|g| g.slug).collect(),
            category: title.category.map(|c| c.slug),
        }
    }
}

/// DTO for creating (or fully replacing) a title.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTitleRequest {
    #[validate(length(min = 1, max = 256, message = "Name must be between 1 and 256 characters"))]
    pub name: String,
    #[validate(custom(function = validate_year))]
    pub year: i32,
    pub description: Option<String>,
    /// Slug of an existing category.
    pub category: Option<String>,
    /// Slugs of existing genres.
    #[serde(default)]
    pub genre: Vec<String>,
}

/// DTO for partially updating a title. Absent fields keep their value;
/// an explicit `null` clears `description` or `category`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTitleRequest {
    #[validate(length(min = 1, max = 256, message = "Name must be between 1 and 256 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = validate_year))]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    pub genre: Option<Vec<String>>,
}

/// Marks a field that appeared in the body, `null` included.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateTitleRequest {
    /// Merges the patch over the current state into a full write request.
    pub fn apply_to(self, current: TitleResponse) -> CreateTitleRequest {
        let current = TitleWriteResponse::from(current);
        CreateTitleRequest {
            name: self.name.unwrap_or(current.name),
            year: self.year.unwrap_or(current.year),
            description: self.description.unwrap_or(current.description),
            category: self.category.unwrap_or(current.category),
            genre: self.genre.unwrap_or(current.genre),
        }
    }
}

/// Query parameters for listing titles.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TitleFilter {
    /// Substring of the title name.
    pub name: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    pub year: Option<i32>,
}
