// src/handlers/user.rs

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
        category::SearchParams,
        user::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges},
    },
    policy,
    store::DynStore,
    utils::{extract::AppJson, jwt::Caller, pagination::PageParams},
};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

async fn load_user(store: &DynStore, username: &str) -> Result<User, AppError> {
    store
        .get_user_by_username(username)
        .await?
        .ok_or_else(user_not_found)
}

/// List all users (Admin only).
pub async fn list_users(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Query(page): Query<PageParams>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    policy::user_admin(caller.principal().as_ref())?;

    let users = store.list_users(params.search.as_deref(), page).await?;
    Ok(Json(users))
}

/// Create a user directly, with any role (Admin only).
pub async fn create_user(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::user_admin(caller.principal().as_ref())?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = store.create_user(&NewUser::from(payload)).await?;
    tracing::info!(username = %user.username, role = %user.role, "User created by admin");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    policy::user_admin(caller.principal().as_ref())?;

    let user = load_user(&store, &username).await?;
    Ok(Json(user))
}

/// Partially update a user, role included (Admin only).
pub async fn update_user(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::user_admin(caller.principal().as_ref())?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let target = load_user(&store, &username).await?;
    let user = store
        .update_user(target.id, &UserChanges::from(payload))
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(user))
}

/// Delete a user with their reviews and comments (Admin only).
pub async fn delete_user(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    policy::user_admin(caller.principal().as_ref())?;

    if !store.delete_user(&username).await? {
        return Err(user_not_found());
    }

    tracing::info!(username = %username, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own profile.
pub async fn get_me(Extension(caller): Extension<Caller>) -> Result<impl IntoResponse, AppError> {
    let me = caller.require_user()?;
    Ok(Json(me.clone()))
}

/// Partially update the caller's own profile. The role never changes here.
pub async fn update_me(
    State(store): State<DynStore>,
    Extension(caller): Extension<Caller>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let me = caller.require_user()?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut changes = UserChanges::from(payload);
    changes.role = Some(me.role);

    let user = store
        .update_user(me.id, &changes)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(user))
}
