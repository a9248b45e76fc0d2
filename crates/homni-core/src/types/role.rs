//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Roles known to the platform.
///
/// Roles are ordered by privilege level:
/// MasterAdmin > Admin > ContentEditor > Company > User > Guest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Unauthenticated visitor.
    #[default]
    Guest,
    /// Authenticated private user submitting service requests.
    User,
    /// Company account receiving and purchasing leads.
    Company,
    /// Editor of public content.
    ContentEditor,
    /// Platform administrator.
    Admin,
    /// Administrator with system-level access.
    MasterAdmin,
}

impl UserRole {
    /// All roles, lowest privilege first.
    pub const ALL: [UserRole; 6] = [
        Self::Guest,
        Self::User,
        Self::Company,
        Self::ContentEditor,
        Self::Admin,
        Self::MasterAdmin,
    ];

    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Guest => 0,
            Self::User => 20,
            Self::Company => 40,
            Self::ContentEditor => 60,
            Self::Admin => 80,
            Self::MasterAdmin => 100,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &UserRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Check if this role is an admin or master admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::MasterAdmin)
    }

    /// Return the role as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Company => "company",
            Self::ContentEditor => "content_editor",
            Self::Admin => "admin",
            Self::MasterAdmin => "master_admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "guest" | "anonymous" => Ok(Self::Guest),
            "user" | "member" => Ok(Self::User),
            "company" | "business" => Ok(Self::Company),
            "content_editor" => Ok(Self::ContentEditor),
            "admin" => Ok(Self::Admin),
            "master_admin" => Ok(Self::MasterAdmin),
            _ => Err(AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: guest, user, company, content_editor, admin, master_admin"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(UserRole::MasterAdmin.has_at_least(&UserRole::Admin));
        assert!(UserRole::Admin.has_at_least(&UserRole::Admin));
        assert!(UserRole::Company.has_at_least(&UserRole::User));
        assert!(!UserRole::Guest.has_at_least(&UserRole::User));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("Master-Admin".parse::<UserRole>().unwrap(), UserRole::MasterAdmin);
        assert_eq!("member".parse::<UserRole>().unwrap(), UserRole::User);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&UserRole::ContentEditor).unwrap();
        assert_eq!(json, "\"content_editor\"");
    }
}
