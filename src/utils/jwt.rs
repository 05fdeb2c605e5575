// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::user::User,
    policy::{Principal, Role},
    state::AppState,
};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// User's role at issue time. Informational; the stored role is authoritative.
    pub role: Role,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a new access token for the user.
pub fn sign_jwt(user: &User, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Identity attached to every API request by [`authenticate`].
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub user: Option<User>,
}

impl Caller {
    pub fn principal(&self) -> Option<Principal> {
        self.user.as_ref().map(User::principal)
    }

    /// The caller's account, or 403 for anonymous requests.
    pub fn require_user(&self) -> Result<&User, AppError> {
        self.user.as_ref().ok_or_else(AppError::forbidden)
    }
}

/// Axum Middleware: Authentication.
///
/// Requests without an 'Authorization' header continue as anonymous.
/// A 'Bearer <token>' header is verified and its subject loaded from the
/// store; any failure along the way returns 401 Unauthorized.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());

    let caller = match auth_header {
        None => Caller::default(),
        Some(header) => {
            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))?;
            let claims = verify_jwt(token.trim(), &state.config.jwt_secret)?;
            let user_id = claims
                .sub
                .parse::<i64>()
                .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))?;
            let user = state
                .store
                .get_user(user_id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
            Caller { user: Some(user) }
        }
    };

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: 42,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            bio: None,
            role,
            is_superuser: false,
            last_login: None,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn signed_token_verifies() {
        let token = sign_jwt(&user(Role::Moderator), "secret", 600).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Moderator);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = sign_jwt(&user(Role::User), "secret", 600).unwrap();
        let err = verify_jwt(&token, "other").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn anonymous_caller_has_no_principal() {
        let caller = Caller::default();
        assert!(caller.principal().is_none());
        assert!(caller.require_user().is_err());
    }
}
