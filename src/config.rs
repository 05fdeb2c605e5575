// src/config.rs

use std::{env, fmt};

const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24;
const DEFAULT_CODE_TTL: u64 = 60 * 60 * 24 * 3;
const DEFAULT_MAIL_FROM: &str = "noreply@yamdb.local";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} must be set", var),
            ConfigError::Invalid(var, value) => write!(f, "{} has invalid value '{}'", var, value),
        }
    }
}

impl std::error::Error for ConfigError {}

/// SMTP relay settings. Present only when `SMTP_HOST` is set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub code_ttl: u64,
    pub mail_from: String,
    pub smtp: Option<SmtpConfig>,
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub bind_addr: String,
    pub rust_log: String,
}

/// Settings the sign-up flow needs, handed over explicitly.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub mail_from: String,
    pub code_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let smtp = match env::var("SMTP_HOST").ok() {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                user: env::var("SMTP_USER").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
            }),
            None => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok(),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", DEFAULT_JWT_EXPIRATION)?,
            code_ttl: parse_var("CONFIRMATION_CODE_TTL", DEFAULT_CODE_TTL)?,
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
            smtp,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Configuration for tests and local tooling: in-memory store, console mail.
    pub fn for_secret(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: DEFAULT_JWT_EXPIRATION,
            code_ttl: DEFAULT_CODE_TTL,
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            smtp: None,
            admin_username: None,
            admin_email: None,
            bind_addr: "127.0.0.1:0".to_string(),
            rust_log: "error".to_string(),
        }
    }

    pub fn registration(&self) -> RegistrationConfig {
        RegistrationConfig {
            mail_from: self.mail_from.clone(),
            code_ttl_secs: self.code_ttl,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}
