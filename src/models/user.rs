// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validation::validate_username;
use crate::policy::{Principal, Role};

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    #[serde(skip)]
    pub id: i64,

    /// Unique username, never "me".
    pub username: String,

    /// Unique email address; confirmation codes are sent here.
    pub email: String,

    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,

    #[sqlx(try_from = "String")]
    pub role: Role,

    #[serde(skip)]
    pub is_superuser: bool,

    /// Part of the confirmation code state; updated on token exchange.
    #[serde(skip)]
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(skip)]
    pub date_joined: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            role: self.role,
            is_superuser: self.is_superuser,
        }
    }
}

/// Everything the store needs to insert a user row.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub role: Role,
    pub is_superuser: bool,
}

/// Field changes for an existing user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

/// DTO for self-registration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters"),
        custom(function = validate_username)
    )]
    pub username: String,
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 254, message = "Email must be at most 254 characters")
    )]
    pub email: String,
}

/// DTO for exchanging a confirmation code for a bearer token.
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "This field is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub confirmation_code: String,
}

/// DTO for an admin creating a user (role may be given).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters"),
        custom(function = validate_username)
    )]
    pub username: String,
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 254, message = "Email must be at most 254 characters")
    )]
    pub email: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            bio: req.bio,
            role: req.role,
            is_superuser: false,
        }
    }
}

/// DTO for partially updating a user, by an admin or by the user themself.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters"),
        custom(function = validate_username)
    )]
    pub username: Option<String>,
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 254, message = "Email must be at most 254 characters")
    )]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            bio: req.bio,
            role: req.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_rejects_reserved_and_malformed_names() {
        let reserved = SignUpRequest {
            username: "me".to_string(),
            email: "me@x.com".to_string(),
        };
        assert!(reserved.validate().is_err());

        let spaced = SignUpRequest {
            username: "bad name".to_string(),
            email: "b@x.com".to_string(),
        };
        assert!(spaced.validate().is_err());

        let bad_email = SignUpRequest {
            username: "bob".to_string(),
            email: "not-an-email".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let ok = SignUpRequest {
            username: "bob".to_string(),
            email: "b@x.com".to_string(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn unknown_role_is_rejected_at_deserialization() {
        let parsed: Result<UpdateUserRequest, _> =
            serde_json::from_value(serde_json::json!({ "role": "owner" }));
        assert!(parsed.is_err());
    }
}
