// src/models/review.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'reviews' table joined with the author's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: i64,
    #[serde(skip)]
    pub title_id: i64,
    pub text: String,
    #[serde(skip)]
    pub author_id: i64,
    /// Username of the author.
    pub author: String,
    pub score: i32,
    /// Set once on creation.
    pub pub_date: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a review. Title and author come from the request context.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, message = "Review text must not be empty"))]
    pub text: String,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10"))]
    pub score: i32,
}

/// DTO for partially updating a review.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, message = "Review text must not be empty"))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10"))]
    pub score: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_must_be_in_range() {
        for score in [0, 11, -3] {
            let request = CreateReviewRequest {
                text: "fine".to_string(),
                score,
            };
            assert!(request.validate().is_err(), "score {} accepted", score);
        }
        let ok = CreateReviewRequest {
            text: "fine".to_string(),
            score: 10,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn partial_update_checks_present_fields_only() {
        let empty = UpdateReviewRequest {
            text: None,
            score: None,
        };
        assert!(empty.validate().is_ok());
        let bad = UpdateReviewRequest {
            text: None,
            score: Some(42),
        };
        assert!(bad.validate().is_err());
    }
}
