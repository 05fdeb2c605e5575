// src/models/validation.rs

use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;
use validator::ValidationError;

/// Username reserved for the self-service profile endpoint.
pub const RESERVED_USERNAME: &str = "me";

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern compiles"));

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Rejects release years later than the current calendar year.
pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    let current_year = Utc::now().year();
    if year > current_year {
        return Err(error(
            "year_in_future",
            format!("Year {} is later than the current year {}", year, current_year),
        ));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if !SLUG_RE.is_match(slug) {
        return Err(error(
            "invalid_slug",
            "Slug may contain only latin letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(error(
            "invalid_username",
            "Username may contain only letters, digits and @/./+/-/_".to_string(),
        ));
    }
    if username == RESERVED_USERNAME {
        return Err(error(
            "reserved_username",
            format!("Username '{}' is reserved", RESERVED_USERNAME),
        ));
    }
    Ok(())
}
