// src/handlers/category.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::category::{CreateCategoryRequest, SearchParams},
    policy::{self, Action},
    store::DynStore,
    utils::{extract::AppJson, jwt::Caller, pagination::PageParams},
};

/// List categories, optionally filtered by a name substring.
pub async fn list_categories(
    State(store): State<DynStore>,
    Query(page): Query<PageParams>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let categories = store.list_categories(params.search.as_deref(), page).await?;
    Ok(Json(categories))
}

/// Create a category. Admin only.
pub async fn create_category(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::catalog_write(caller.principal().as_ref(), Action::Create)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let category = store.create_category(&payload.name, &payload.slug).await?;
    tracing::info!(slug = %category.slug, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Delete a category by slug. Its titles stay, without a category.
pub async fn delete_category(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    policy::catalog_write(caller.principal().as_ref(), Action::Delete)?;

    if !store.delete_category(&slug).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
