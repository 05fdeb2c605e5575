// src/policy.rs

//! Role enumeration and the access-control rules applied by handlers.
//!
//! Every rule is a pure function of the caller (if any), the requested action
//! and, for authored content, the author id. Rules never consult each other.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create and delete categories, genres and titles.
    EditCatalog,
    /// List, create, update and delete user accounts.
    ManageUsers,
    /// Edit or delete reviews and comments written by others.
    ModerateContent,
}

const USER_CAPABILITIES: &[Capability] = &[];
const MODERATOR_CAPABILITIES: &[Capability] = &[Capability::ModerateContent];
const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::EditCatalog,
    Capability::ManageUsers,
    Capability::ModerateContent,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::User => USER_CAPABILITIES,
            Role::Moderator => MODERATOR_CAPABILITIES,
            Role::Admin => ADMIN_CAPABILITIES,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

/// What the caller is trying to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn is_read(&self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

/// The authenticated identity a rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
    pub is_superuser: bool,
}

/// Category, genre and title mutations: admins only. Reads are open.
pub fn catalog_write(caller: Option<&Principal>, action: Action) -> Result<(), AppError> {
    if action.is_read() {
        return Ok(());
    }
    match caller {
        Some(p) if p.role.can(Capability::EditCatalog) => Ok(()),
        _ => Err(AppError::forbidden()),
    }
}

/// The admin user surface: admins or superusers, for every action.
pub fn user_admin(caller: Option<&Principal>) -> Result<(), AppError> {
    match caller {
        Some(p) if p.is_superuser || p.role.can(Capability::ManageUsers) => Ok(()),
        _ => Err(AppError::forbidden()),
    }
}

/// Review and comment update/delete: the author, a moderator or an admin.
pub fn content_ownership(
    caller: Option<&Principal>,
    action: Action,
    author_id: i64,
) -> Result<(), AppError> {
    if action.is_read() {
        return Ok(());
    }
    match caller {
        Some(p) if p.user_id == author_id || p.role.can(Capability::ModerateContent) => Ok(()),
        _ => Err(AppError::forbidden()),
    }
}

/// Review and comment creation: any authenticated caller.
pub fn content_create(caller: Option<&Principal>) -> Result<(), AppError> {
    caller.map(|_| ()).ok_or_else(AppError::forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(user_id: i64, role: Role) -> Principal {
        Principal {
            user_id,
            role,
            is_superuser: false,
        }
    }

    #[test]
    fn capabilities_are_flat() {
        assert!(Role::Admin.can(Capability::EditCatalog));
        assert!(Role::Moderator.can(Capability::ModerateContent));
        assert!(!Role::Moderator.can(Capability::EditCatalog));
        assert!(!Role::Moderator.can(Capability::ManageUsers));
        assert!(Role::User.capabilities().is_empty());
    }

    #[test]
    fn catalog_reads_are_open_writes_need_admin() {
        assert!(catalog_write(None, Action::List).is_ok());
        assert!(catalog_write(None, Action::Retrieve).is_ok());
        assert!(catalog_write(None, Action::Create).is_err());
        assert!(catalog_write(Some(&principal(1, Role::Moderator)), Action::Delete).is_err());
        assert!(catalog_write(Some(&principal(1, Role::Admin)), Action::Create).is_ok());
    }

    #[test]
    fn user_admin_accepts_superuser_without_admin_role() {
        let superuser = Principal {
            user_id: 1,
            role: Role::User,
            is_superuser: true,
        };
        assert!(user_admin(Some(&superuser)).is_ok());
        assert!(user_admin(Some(&principal(2, Role::Admin))).is_ok());
        assert!(user_admin(Some(&principal(3, Role::Moderator))).is_err());
        assert!(user_admin(None).is_err());
    }

    #[test]
    fn content_ownership_rules() {
        let author = principal(7, Role::User);
        let stranger = principal(8, Role::User);
        assert!(content_ownership(Some(&author), Action::Update, 7).is_ok());
        assert!(content_ownership(Some(&stranger), Action::Update, 7).is_err());
        assert!(content_ownership(Some(&stranger), Action::Retrieve, 7).is_ok());
        assert!(content_ownership(None, Action::List, 7).is_ok());
        assert!(content_ownership(None, Action::Delete, 7).is_err());
        assert!(content_ownership(Some(&principal(9, Role::Moderator)), Action::Delete, 7).is_ok());
        assert!(content_ownership(Some(&principal(10, Role::Admin)), Action::Update, 7).is_ok());
    }

    #[test]
    fn content_create_needs_identity_only() {
        assert!(content_create(None).is_err());
        assert!(content_create(Some(&principal(1, Role::User))).is_ok());
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(Role::try_from("moderator".to_string()).unwrap(), Role::Moderator);
        assert!(Role::try_from("owner".to_string()).is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
