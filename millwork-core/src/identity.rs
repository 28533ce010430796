use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Account roles. Row-level enforcement lives in the hosted backend; this is
/// the application-side view of the same policy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Sales,
    #[default]
    Visitor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ViewCatalog,
    ManageQuotes,
    ManageOrders,
    IssueReceipts,
    ManageSettings,
    ManageUsers,
}

impl Role {
    pub fn can(self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::Sales => matches!(
                permission,
                Permission::ViewCatalog
                    | Permission::ManageQuotes
                    | Permission::ManageOrders
                    | Permission::IssueReceipts
            ),
            Role::Visitor => permission == Permission::ViewCatalog,
        }
    }

    /// Same as [`Role::can`] but as a `CoreResult`, for `?` at call sites.
    pub fn require(self, permission: Permission) -> CoreResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::debug!(role = %self, ?permission, "Permission check failed");
            Err(CoreError::PermissionDenied { role: self, permission })
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Sales => "sales",
            Role::Visitor => "visitor",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::ViewCatalog => "view the catalog",
            Permission::ManageQuotes => "manage quotes",
            Permission::ManageOrders => "manage orders",
            Permission::IssueReceipts => "issue receipts",
            Permission::ManageSettings => "manage settings",
            Permission::ManageUsers => "manage users",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "sales" => Ok(Role::Sales),
            "visitor" => Ok(Role::Visitor),
            other => Err(CoreError::ValidationError(format!("Unknown role: {}", other))),
        }
    }
}

/// A user account as stored by the auth backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl UserProfile {
    /// Full name when both parts are known, otherwise whichever part exists,
    /// otherwise the email address.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().filter(|s| !s.is_empty());
        let last = self.last_name.as_deref().filter(|s| !s.is_empty());

        match (first, last) {
            (Some(f), Some(l)) => format!("{} {}", f, l),
            (Some(f), None) => f.to_string(),
            (None, Some(l)) => l.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: Option<&str>, last: Option<&str>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: "ana@shop.test".to_string(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            role: Role::Sales,
        }
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can(Permission::ManageUsers));
        assert!(Role::Admin.can(Permission::ManageSettings));

        assert!(Role::Sales.can(Permission::ManageQuotes));
        assert!(Role::Sales.can(Permission::IssueReceipts));
        assert!(!Role::Sales.can(Permission::ManageSettings));
        assert!(!Role::Sales.can(Permission::ManageUsers));

        assert!(Role::Visitor.can(Permission::ViewCatalog));
        assert!(!Role::Visitor.can(Permission::ManageQuotes));
    }

    #[test]
    fn test_require_returns_permission_denied() {
        let err = Role::Visitor.require(Permission::ManageOrders).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PermissionDenied { role: Role::Visitor, permission: Permission::ManageOrders }
        ));
        assert!(Role::Sales.require(Permission::ManageOrders).is_ok());
    }

    #[test]
    fn test_role_parsing_and_default() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("sales".parse::<Role>().unwrap(), Role::Sales);
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Visitor);

        let user: UserProfile = serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "email": "x@y.z",
            "first_name": null,
            "last_name": null
        }))
        .unwrap();
        assert_eq!(user.role, Role::Visitor);
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(profile(Some("Ana"), Some("Ruiz")).display_name(), "Ana Ruiz");
        assert_eq!(profile(Some("Ana"), None).display_name(), "Ana");
        assert_eq!(profile(None, Some("Ruiz")).display_name(), "Ruiz");
        assert_eq!(profile(None, None).display_name(), "ana@shop.test");
        assert_eq!(profile(Some(""), None).display_name(), "ana@shop.test");
    }
}
