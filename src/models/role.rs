use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::status::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Operator,
    Management,
}

/// Actions guarded by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewInventory,
    ManageInventory,
    DeleteInventory,
    ViewCategories,
    ManageCategories,
    DeleteCategories,
    IssueItems,
    ViewIssuance,
    ViewAllIssuance,
    ViewEmployees,
    ManageEmployees,
    /// Read and write access to departments and designations.
    ManageOrganization,
    ManageUsers,
    ViewAuditLogs,
    ManageStock,
    ViewReports,
    ManageDocuments,
}

const READ_ONLY: &[Permission] = &[
    Permission::ViewInventory,
    Permission::ViewCategories,
    Permission::ViewIssuance,
    Permission::ViewAllIssuance,
    Permission::ViewEmployees,
    Permission::ViewReports,
    Permission::ManageDocuments,
];

const OPERATOR: &[Permission] = &[
    Permission::ManageInventory,
    Permission::ManageCategories,
    Permission::IssueItems,
    Permission::ManageEmployees,
    Permission::ManageOrganization,
    Permission::ManageStock,
];

const ADMIN_ONLY: &[Permission] = &[
    Permission::DeleteInventory,
    Permission::DeleteCategories,
    Permission::ManageUsers,
    Permission::ViewAuditLogs,
];

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Operator, Role::Management];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Operator => "Operator",
            Role::Management => "Management",
        }
    }

    pub fn allows(self, permission: Permission) -> bool {
        let tiers: &[&[Permission]] = match self {
            Role::Admin => &[READ_ONLY, OPERATOR, ADMIN_ONLY],
            Role::Operator => &[READ_ONLY, OPERATOR],
            Role::Management => &[READ_ONLY],
        };
        tiers.iter().any(|tier| tier.contains(&permission))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "role",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        for p in READ_ONLY.iter().chain(OPERATOR).chain(ADMIN_ONLY) {
            assert!(Role::Admin.allows(*p), "{:?}", p);
        }
    }

    #[test]
    fn test_operator_cannot_delete_or_manage_users() {
        assert!(Role::Operator.allows(Permission::IssueItems));
        assert!(Role::Operator.allows(Permission::ManageStock));
        assert!(!Role::Operator.allows(Permission::DeleteInventory));
        assert!(!Role::Operator.allows(Permission::DeleteCategories));
        assert!(!Role::Operator.allows(Permission::ManageUsers));
        assert!(!Role::Operator.allows(Permission::ViewAuditLogs));
    }

    #[test]
    fn test_management_is_read_only() {
        assert!(Role::Management.allows(Permission::ViewInventory));
        assert!(Role::Management.allows(Permission::ViewAllIssuance));
        assert!(Role::Management.allows(Permission::ViewReports));
        assert!(!Role::Management.allows(Permission::IssueItems));
        assert!(!Role::Management.allows(Permission::ManageInventory));
        assert!(!Role::Management.allows(Permission::ManageOrganization));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Operator".parse::<Role>().unwrap(), Role::Operator);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Management).unwrap(), "\"Management\"");
    }
}
