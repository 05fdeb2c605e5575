// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    config::RegistrationConfig,
    error::AppError,
    mail::Mailer,
    models::user::{NewUser, SignUpRequest, TokenRequest, User},
    state::AppState,
    utils::{
        confirmation::{check_confirmation_code, make_confirmation_code},
        extract::AppJson,
        jwt::sign_jwt,
    },
};

const CONFIRMATION_SUBJECT: &str = "YaMDb confirmation code";

/// Mails a fresh confirmation code for the user's current state.
async fn send_confirmation_code(
    mailer: &dyn Mailer,
    user: &User,
    secret: &str,
    registration: &RegistrationConfig,
) -> Result<(), AppError> {
    let code = make_confirmation_code(user, secret, Utc::now())?;
    let body = format!(
        "Hello {},\n\nyour confirmation code is: {}\n\nIt is valid for {} hours.",
        user.username,
        code,
        registration.code_ttl_secs / 3600
    );

    mailer
        .send(CONFIRMATION_SUBJECT, &body, &registration.mail_from, &user.email)
        .await
}

/// Registers a user and mails a confirmation code.
///
/// Repeating the request with the same username and email resends a code
/// without validating the payload again. Returns 200 with `{username, email}`.
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let registration = state.config.registration();

    let user = match state
        .store
        .find_user(&payload.username, &payload.email)
        .await?
    {
        Some(existing) => {
            tracing::info!(username = %existing.username, "Resending confirmation code");
            existing
        }
        None => {
            if let Err(validation_errors) = payload.validate() {
                return Err(AppError::BadRequest(validation_errors.to_string()));
            }

            let new_user = NewUser {
                username: payload.username.clone(),
                email: payload.email.clone(),
                ..Default::default()
            };
            // A taken username or email is a validation failure on sign-up.
            let user = state.store.create_user(&new_user).await.map_err(|e| match e {
                AppError::Conflict(message) => AppError::BadRequest(message),
                other => other,
            })?;
            tracing::info!(username = %user.username, "User signed up");
            user
        }
    };

    send_confirmation_code(
        state.mailer.as_ref(),
        &user,
        &state.config.jwt_secret,
        &registration,
    )
    .await?;

    Ok(Json(payload))
}

/// Exchanges a confirmation code for a bearer token.
///
/// A successful exchange records the login, which consumes the code.
pub async fn token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = state
        .store
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let now = Utc::now();
    let valid = check_confirmation_code(
        &user,
        &payload.confirmation_code,
        &state.config.jwt_secret,
        state.config.registration().code_ttl_secs,
        now,
    )?;

    if !valid {
        return Err(AppError::AuthError("Invalid confirmation code".to_string()));
    }

    state.store.record_login(user.id, now).await?;

    let token = sign_jwt(&user, &state.config.jwt_secret, state.config.jwt_expiration)?;
    tracing::info!(username = %user.username, "Access token issued");

    Ok(Json(json!({ "token": token })))
}
