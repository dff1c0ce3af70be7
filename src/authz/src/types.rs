//! Core permission graph and subject types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Unique permission identifier
    PermissionId
);
id_type!(
    /// Unique role identifier
    RoleId
);
id_type!(
    /// Unique user identifier
    UserId
);

/// A single permission, named `"module.action"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionNode {
    /// Permission identifier
    pub id: PermissionId,

    /// Full permission name (e.g., "users.edit")
    pub name: String,

    /// Module the permission belongs to (e.g., "users")
    pub module: String,

    /// Permission type / action suffix (e.g., "edit")
    #[serde(rename = "type")]
    pub permission_type: String,

    /// Built-in permission that ships with the system
    #[serde(default)]
    pub is_system: bool,
}

impl PermissionNode {
    /// Create a permission with explicit module and type
    pub fn new(
        id: u64,
        name: impl Into<String>,
        module: impl Into<String>,
        permission_type: impl Into<String>,
    ) -> Self {
        Self {
            id: PermissionId(id),
            name: name.into(),
            module: module.into(),
            permission_type: permission_type.into(),
            is_system: false,
        }
    }

    /// Create a permission, deriving module and type from a `"module.action"` name
    ///
    /// The split happens on the last `.`, so `"reports.daily.view"` has module
    /// `"reports.daily"` and type `"view"`. A name without a dot is its own module
    /// with an empty type.
    pub fn from_name(id: u64, name: impl Into<String>) -> Self {
        let name = name.into();
        let (module, permission_type) = match name.rsplit_once('.') {
            Some((module, action)) => (module.to_string(), action.to_string()),
            None => (name.clone(), String::new()),
        };

        Self {
            id: PermissionId(id),
            name,
            module,
            permission_type,
            is_system: false,
        }
    }

    /// Mark the permission as a system permission
    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }
}

/// Directed dependency: `from` requires `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The dependent permission
    pub from: PermissionId,

    /// The permission it depends on
    pub to: PermissionId,
}

impl DependencyEdge {
    pub fn new(from: u64, to: u64) -> Self {
        Self {
            from: PermissionId(from),
            to: PermissionId(to),
        }
    }
}

/// Role in the role hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleNode {
    /// Role identifier
    pub id: RoleId,

    /// Display name
    pub name: String,

    /// Parent role; a child inherits every permission assigned to its ancestors
    #[serde(default)]
    pub parent_role_id: Option<RoleId>,

    /// Permissions assigned directly to this role
    #[serde(default)]
    pub direct_permission_ids: BTreeSet<PermissionId>,
}

impl RoleNode {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: RoleId(id),
            name: name.into(),
            parent_role_id: None,
            direct_permission_ids: BTreeSet::new(),
        }
    }

    /// Set the parent role
    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent_role_id = Some(RoleId(parent));
        self
    }

    /// Assign a permission directly
    pub fn with_permission(mut self, permission: u64) -> Self {
        self.direct_permission_ids.insert(PermissionId(permission));
        self
    }
}

/// User with role assignments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSubject {
    /// User identifier
    pub id: UserId,

    /// Roles assigned to the user
    #[serde(default)]
    pub role_ids: BTreeSet<RoleId>,

    /// Super-admins hold every permission
    #[serde(default)]
    pub is_super_admin: bool,
}

impl UserSubject {
    pub fn new(id: u64) -> Self {
        Self {
            id: UserId(id),
            role_ids: BTreeSet::new(),
            is_super_admin: false,
        }
    }

    /// Assign a role
    pub fn with_role(mut self, role: u64) -> Self {
        self.role_ids.insert(RoleId(role));
        self
    }

    /// Grant the super-admin override
    pub fn super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }
}

/// Kind of subject an authorization check is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    User,
    Role,
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectType::User => write!(f, "user"),
            SubjectType::Role => write!(f, "role"),
        }
    }
}

impl FromStr for SubjectType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(SubjectType::User),
            "role" => Ok(SubjectType::Role),
            other => Err(GraphError::InvalidInput(format!(
                "unknown subject type '{}', expected 'user' or 'role'",
                other
            ))),
        }
    }
}

/// Subject of an authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject<'a> {
    User(&'a UserSubject),
    Role(RoleId),
}

impl Subject<'_> {
    /// Roles whose hierarchy chains are consulted, in ascending id order
    pub fn role_set(&self) -> BTreeSet<RoleId> {
        match self {
            Subject::User(user) => user.role_ids.clone(),
            Subject::Role(role_id) => BTreeSet::from([*role_id]),
        }
    }

    /// Whether the super-admin override applies
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Subject::User(user) if user.is_super_admin)
    }
}

/// One step of a grant path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathStep {
    /// Granted by the super-admin override
    SuperAdmin,

    /// Assigned directly to the role
    Direct { role_id: RoleId },

    /// Inherited by `role_id` from `ancestor_role_id`
    Inherited {
        role_id: RoleId,
        ancestor_role_id: RoleId,
    },
}

/// Outcome of an authorization check with its explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Whether the subject holds the permission
    pub granted: bool,

    /// Why the permission is held; empty when denied
    pub path: Vec<PathStep>,
}

impl Resolution {
    pub fn granted(step: PathStep) -> Self {
        Self {
            granted: true,
            path: vec![step],
        }
    }

    pub fn denied() -> Self {
        Self {
            granted: false,
            path: Vec::new(),
        }
    }
}
