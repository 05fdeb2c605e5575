use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'comments' table joined with the author's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,
    #[serde(skip)]
    pub title_id: i64,
    #[serde(skip)]
    pub review_id: i64,
    pub text: String,
    #[serde(skip)]
    pub author_id: i64,
    pub author: String,
    pub pub_date: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "Comment must not be empty"))]
    pub text: String,
}

/// DTO for partially updating a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, message = "Comment must not be empty"))]
    pub text: Option<String>,
}
