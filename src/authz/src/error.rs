//! Error types for the permission graph and authorization resolver

use thiserror::Error;

use crate::types::{PermissionId, RoleId, UserId};

/// Ordered list of permission ids describing a dependency path
pub type CyclePath = Vec<PermissionId>;

/// Entity that could not be found in the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("permission {0}")]
    Permission(PermissionId),

    #[error("permission named '{0}'")]
    PermissionName(String),

    #[error("role {0}")]
    Role(RoleId),

    #[error("user {0}")]
    User(UserId),
}

/// Permission graph and resolver errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A permission cannot depend on itself
    #[error("Permission {0} cannot depend on itself")]
    SelfDependency(PermissionId),

    /// Unknown id or name
    #[error("Not found: {0}")]
    NotFound(#[from] NotFound),

    /// Adding the edge would close a cycle; `cycle_path` runs from `to` back to `from`
    #[error(
        "Circular dependency: {from} -> {to} would close the cycle {from} -> {}",
        format_path(.cycle_path)
    )]
    CircularDependency {
        from: PermissionId,
        to: PermissionId,
        cycle_path: CyclePath,
    },

    /// Permission id or name is duplicated in the snapshot
    #[error("Duplicate permission: {0}")]
    DuplicatePermission(String),

    /// Role id is duplicated in the snapshot
    #[error("Duplicate role: {0}")]
    DuplicateRole(RoleId),

    /// User id is duplicated in the snapshot
    #[error("Duplicate user: {0}")]
    DuplicateUser(UserId),

    /// Parent links of the role hierarchy loop back on themselves
    #[error("Role hierarchy cycle: {}", format_roles(.0))]
    RoleHierarchyCycle(Vec<RoleId>),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Snapshot provider or edge sink failure
    #[error("Store error: {0}")]
    Store(String),
}

impl GraphError {
    /// Whether the error reports a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }
}

/// Result type for permission graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Render a path as `a -> b -> c`
pub fn format_path(path: &[PermissionId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_roles(path: &[RoleId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
