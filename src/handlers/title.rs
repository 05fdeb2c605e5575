// src/handlers/title.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::title::{CreateTitleRequest, TitleFilter, TitleWriteResponse, UpdateTitleRequest},
    policy::{self, Action},
    store::DynStore,
    utils::{extract::AppJson, jwt::Caller, pagination::PageParams},
};

fn title_not_found() -> AppError {
    AppError::NotFound("Title not found".to_string())
}

/// List titles.
///
/// Filters: `name` (substring), `category` and `genre` (slugs), `year`.
pub async fn list_titles(
    State(store): State<DynStore>,
    Query(page): Query<PageParams>,
    Query(filter): Query<TitleFilter>,
) -> Result<impl IntoResponse, AppError> {
    let titles = store.list_titles(&filter, page).await?;
    Ok(Json(titles))
}

/// Get a single title with its rating.
pub async fn get_title(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let title = store.get_title(id).await?.ok_or_else(title_not_found)?;
    Ok(Json(title))
}

/// Create a title. Admin only.
/// Category and genres are given by slug and must exist.
pub async fn create_title(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    AppJson(payload): AppJson<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::catalog_write(caller.principal().as_ref(), Action::Create)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let title = store.create_title(&payload).await?;
    tracing::info!(title_id = title.id, "Title created");

    Ok((StatusCode::CREATED, Json(TitleWriteResponse::from(title))))
}

/// Replace every field of a title (PUT). Admin only.
pub async fn replace_title(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::catalog_write(caller.principal().as_ref(), Action::Update)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let title = store
        .update_title(id, &payload)
        .await?
        .ok_or_else(title_not_found)?;

    Ok(Json(TitleWriteResponse::from(title)))
}

/// Partially update a title (PATCH). Admin only.
pub async fn update_title(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::catalog_write(caller.principal().as_ref(), Action::Update)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let current = store.get_title(id).await?.ok_or_else(title_not_found)?;
    let merged = payload.apply_to(current);

    let title = store
        .update_title(id, &merged)
        .await?
        .ok_or_else(title_not_found)?;

    Ok(Json(TitleWriteResponse::from(title)))
}

/// Delete a title together with its reviews and comments. Admin only.
pub async fn delete_title(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::catalog_write(caller.principal().as_ref(), Action::Delete)?;

    if !store.delete_title(id).await? {
        return Err(title_not_found());
    }

    tracing::info!(title_id = id, "Title deleted");
    Ok(StatusCode::NO_CONTENT)
}
