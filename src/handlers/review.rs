// src/handlers/review.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::review::{CreateReviewRequest, Review, UpdateReviewRequest},
    policy::{self, Action},
    store::DynStore,
    utils::{extract::AppJson, jwt::Caller, pagination::PageParams},
};

async fn require_title(store: &DynStore, title_id: i64) -> Result<(), AppError> {
    store
        .get_title(title_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Title not found".to_string()))
}

async fn load_review(store: &DynStore, title_id: i64, review_id: i64) -> Result<Review, AppError> {
    store
        .get_review(title_id, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
}

pub async fn list_reviews(
    State(store): State<DynStore>,
    Path(title_id): Path<i64>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    require_title(&store, title_id).await?;
    let reviews = store.list_reviews(title_id, page).await?;
    Ok(Json(reviews))
}

pub async fn get_review(
    State(store): State<DynStore>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let review = load_review(&store, title_id, review_id).await?;
    Ok(Json(review))
}

/// Create a review as the caller. One review per author and title.
pub async fn create_review(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(title_id): Path<i64>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::content_create(caller.principal().as_ref())?;
    let author = caller.require_user()?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    require_title(&store, title_id).await?;

    let review = store
        .create_review(title_id, author.id, &payload.text, payload.score)
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Partially update a review. Author, moderator or admin.
pub async fn update_review(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let review = load_review(&store, title_id, review_id).await?;
    policy::content_ownership(caller.principal().as_ref(), Action::Update, review.author_id)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let review = store
        .update_review(review.id, payload.text.as_deref(), payload.score)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    Ok(Json(review))
}

/// Delete a review and its comments. Author, moderator or admin.
pub async fn delete_review(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let review = load_review(&store, title_id, review_id).await?;
    policy::content_ownership(caller.principal().as_ref(), Action::Delete, review.author_id)?;

    store.delete_review(review.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
