// src/utils/confirmation.rs

//! Single-use confirmation codes for the sign-up flow.
//!
//! A code is `<issued-at base36>-<hmac hex>`. The HMAC covers the user's id,
//! username, email and last login time, so recording a login invalidates
//! every code issued before it.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{error::AppError, models::user::User};

type HmacSha256 = Hmac<Sha256>;

/// Bytes of the MAC kept in the code.
const SIGNATURE_BYTES: usize = 20;

pub fn make_confirmation_code(
    user: &User,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let issued_at = now.timestamp();
    Ok(format!(
        "{}-{}",
        to_base36(issued_at),
        signature(user, issued_at, secret)?
    ))
}

pub fn check_confirmation_code(
    user: &User,
    code: &str,
    secret: &str,
    ttl_secs: u64,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let Some((stamp, given)) = code.split_once('-') else {
        return Ok(false);
    };
    let Some(issued_at) = from_base36(stamp) else {
        return Ok(false);
    };

    let expected = signature(user, issued_at, secret)?;
    if !constant_time_eq::constant_time_eq(expected.as_bytes(), given.as_bytes()) {
        return Ok(false);
    }

    let age = now.timestamp() - issued_at;
    Ok(age >= 0 && (age as u64) <= ttl_secs)
}

fn signature(user: &User, issued_at: i64, secret: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    let login = user
        .last_login
        .map(|t| t.timestamp_micros().to_string())
        .unwrap_or_default();
    mac.update(
        format!(
            "{}|{}|{}|{}|{}",
            user.id, user.username, user.email, login, issued_at
        )
        .as_bytes(),
    );
    let digest = mac.finalize().into_bytes();
    Ok(digest[..SIGNATURE_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

fn to_base36(mut value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(value: &str) -> Option<i64> {
    if value.is_empty() || value.len() > 13 {
        return None;
    }
    i64::from_str_radix(value, 36).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use chrono::Duration;

    const SECRET: &str = "confirmation-test-secret";

    fn user() -> User {
        User {
            id: 1,
            username: "bob".to_string(),
            email: "b@x.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            bio: None,
            role: Role::User,
            is_superuser: false,
            last_login: None,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn issued_code_checks_out() {
        let now = Utc::now();
        let code = make_confirmation_code(&user(), SECRET, now).unwrap();
        assert!(check_confirmation_code(&user(), &code, SECRET, 60, now).unwrap());
    }

    #[test]
    fn login_consumes_code() {
        let now = Utc::now();
        let mut u = user();
        let code = make_confirmation_code(&u, SECRET, now).unwrap();
        u.last_login = Some(now);
        assert!(!check_confirmation_code(&u, &code, SECRET, 60, now).unwrap());
    }

    #[test]
    fn expired_or_foreign_codes_fail() {
        let now = Utc::now();
        let code = make_confirmation_code(&user(), SECRET, now).unwrap();
        let later = now + Duration::seconds(61);
        assert!(!check_confirmation_code(&user(), &code, SECRET, 60, later).unwrap());
        assert!(!check_confirmation_code(&user(), &code, "other", 60, now).unwrap());

        let mut other = user();
        other.email = "c@x.com".to_string();
        assert!(!check_confirmation_code(&other, &code, SECRET, 60, now).unwrap());
    }

    #[test]
    fn tampered_signature_fails() {
        let now = Utc::now();
        let code = make_confirmation_code(&user(), SECRET, now).unwrap();
        let (stamp, sig) = code.split_once('-').unwrap();
        let flipped = if sig.starts_with('0') { "1" } else { "0" };
        let tampered = format!("{}-{}{}", stamp, flipped, &sig[1..]);
        assert_eq!(tampered.len(), code.len());
        assert!(!check_confirmation_code(&user(), &tampered, SECRET, 60, now).unwrap());
    }

    #[test]
    fn garbage_codes_fail() {
        let now = Utc::now();
        for code in ["", "nodash", "-abc", "zzzzzzzzzzzzzzzz-00", "1-"] {
            assert!(!check_confirmation_code(&user(), code, SECRET, 60, now).unwrap());
        }
    }

    #[test]
    fn base36_round_trip() {
        assert_eq!(from_base36(&to_base36(1_700_000_000)), Some(1_700_000_000));
    }
}
