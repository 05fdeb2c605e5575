// src/handlers/genre.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{category::SearchParams, genre::CreateGenreRequest},
    policy::{self, Action},
    store::DynStore,
    utils::{extract::AppJson, jwt::Caller, pagination::PageParams},
};

pub async fn list_genres(
    State(store): State<DynStore>,
    Query(page): Query<PageParams>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let genres = store.list_genres(params.search.as_deref(), page).await?;
    Ok(Json(genres))
}

pub async fn create_genre(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    AppJson(payload): AppJson<CreateGenreRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::catalog_write(caller.principal().as_ref(), Action::Create)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let genre = store.create_genre(&payload.name, &payload.slug).await?;
    tracing::info!(slug = %genre.slug, "Genre created");

    Ok((StatusCode::CREATED, Json(genre)))
}

pub async fn delete_genre(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    policy::catalog_write(caller.principal().as_ref(), Action::Delete)?;

    if !store.delete_genre(&slug).await? {
        return Err(AppError::NotFound("Genre not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
