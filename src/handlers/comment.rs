// src/handlers/comment.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        comment::{Comment, CommentRequest, UpdateCommentRequest},
        review::Review,
    },
    policy::{self, Action},
    store::DynStore,
    utils::{extract::AppJson, jwt::Caller, pagination::PageParams},
};

/// The parent review, which must belong to the title in the path.
async fn require_review(store: &DynStore, title_id: i64, review_id: i64) -> Result<Review, AppError> {
    store
        .get_review(title_id, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
}

async fn load_comment(
    store: &DynStore,
    title_id: i64,
    review_id: i64,
    comment_id: i64,
) -> Result<Comment, AppError> {
    require_review(store, title_id, review_id).await?;
    store
        .get_comment(review_id, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

pub async fn list_comments(
    State(store): State<DynStore>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    require_review(&store, title_id, review_id).await?;
    let comments = store.list_comments(review_id, page).await?;
    Ok(Json(comments))
}

pub async fn get_comment(
    State(store): State<DynStore>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let comment = load_comment(&store, title_id, review_id, comment_id).await?;
    Ok(Json(comment))
}

pub async fn create_comment(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::content_create(caller.principal().as_ref())?;
    let author = caller.require_user()?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let review = require_review(&store, title_id, review_id).await?;
    let comment = store
        .create_comment(review.title_id, review.id, author.id, &payload.text)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = load_comment(&store, title_id, review_id, comment_id).await?;
    policy::content_ownership(caller.principal().as_ref(), Action::Update, comment.author_id)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let comment = store
        .update_comment(comment.id, payload.text.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let comment = load_comment(&store, title_id, review_id, comment_id).await?;
    policy::content_ownership(caller.principal().as_ref(), Action::Delete, comment.author_id)?;

    store.delete_comment(comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
