//! Authorization resolver
//!
//! Decides whether a user or role holds a permission and reconstructs the
//! exact grant path: super-admin override, direct assignment, or inheritance
//! through the role hierarchy.
//!
//! # Example
//!
//! ```rust
//! use permgraph_authz::resolver::AuthorizationResolver;
//! use permgraph_authz::types::{PathStep, PermissionNode, RoleId, RoleNode, SubjectType, UserSubject};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let permissions = vec![PermissionNode::from_name(1, "users.edit")];
//! let roles = vec![
//!     RoleNode::new(1, "editor").with_permission(1),
//!     RoleNode::new(2, "junior-editor").with_parent(1),
//! ];
//! let users = vec![UserSubject::new(10).with_role(2)];
//!
//! let resolver = AuthorizationResolver::new(&permissions, roles, users)?;
//! let resolution = resolver.resolve(SubjectType::User, 10, "users.edit")?;
//!
//! assert!(resolution.granted);
//! assert_eq!(
//!     resolution.path,
//!     vec![PathStep::Inherited { role_id: RoleId(2), ancestor_role_id: RoleId(1) }]
//! );
//! # Ok(())
//! # }
//! ```

pub mod authorization;


pub use authorization::{AuthorizationResolver, EffectivePermission, UnmetDependency};
