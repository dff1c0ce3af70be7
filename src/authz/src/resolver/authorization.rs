//! Authorization resolver with grant-path reconstruction
//!
//! Answers "does this subject hold this permission, and why?" over a role
//! hierarchy snapshot. Channels are checked in strict priority order:
//!
//! 1. Super-admin override
//! 2. Direct assignment on one of the subject's roles
//! 3. Inheritance from an ancestor of one of the subject's roles
//!
//! Roles are visited in ascending id order so the reported path is
//! reproducible. Dependency edges never grant anything; they are only used by
//! [`AuthorizationResolver::unmet_dependencies`] for consistency diagnostics.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, NotFound, Result};
use crate::graph::PermissionGraph;
use crate::types::{
    PathStep, PermissionId, PermissionNode, Resolution, RoleId, RoleNode, Subject, SubjectType,
    UserId, UserSubject,
};

/// A permission the subject holds, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    pub permission_id: PermissionId,
    pub name: String,
    pub path: Vec<PathStep>,
}

/// A held permission whose dependencies are not all held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetDependency {
    pub permission_id: PermissionId,
    pub missing: Vec<PermissionId>,
}

/// Resolves grants over one role hierarchy snapshot
#[derive(Debug, Clone, Default)]
pub struct AuthorizationResolver {
    /// Permission name -> id
    permission_ids: HashMap<String, PermissionId>,

    /// Permission id -> name, ascending
    permission_names: BTreeMap<PermissionId, String>,

    roles: BTreeMap<RoleId, RoleNode>,

    users: BTreeMap<UserId, UserSubject>,
}

impl AuthorizationResolver {
    /// Build a resolver from snapshot data
    ///
    /// # Errors
    ///
    /// - `DuplicatePermission` for a repeated permission id or name
    /// - `DuplicateRole` / `DuplicateUser` for repeated ids
    /// - `NotFound` when a role names an unknown parent
    /// - `RoleHierarchyCycle` when parent links loop
    pub fn new(
        permissions: &[PermissionNode],
        roles: impl IntoIterator<Item = RoleNode>,
        users: impl IntoIterator<Item = UserSubject>,
    ) -> Result<Self> {
        let mut resolver = Self::default();

        for permission in permissions {
            if resolver.permission_names.contains_key(&permission.id)
                || resolver.permission_ids.contains_key(&permission.name)
            {
                return Err(GraphError::DuplicatePermission(permission.name.clone()));
            }
            resolver
                .permission_ids
                .insert(permission.name.clone(), permission.id);
            resolver
                .permission_names
                .insert(permission.id, permission.name.clone());
        }

        for role in roles {
            if resolver.roles.contains_key(&role.id) {
                return Err(GraphError::DuplicateRole(role.id));
            }
            resolver.roles.insert(role.id, role);
        }

        for user in users {
            if resolver.users.contains_key(&user.id) {
                return Err(GraphError::DuplicateUser(user.id));
            }
            resolver.users.insert(user.id, user);
        }

        resolver.validate_hierarchy()?;
        Ok(resolver)
    }

    /// Check that every parent exists and the parent links form a forest
    fn validate_hierarchy(&self) -> Result<()> {
        let mut cleared: BTreeSet<RoleId> = BTreeSet::new();

        for &start in self.roles.keys() {
            let mut walk: Vec<RoleId> = Vec::new();
            let mut cursor = Some(start);

            while let Some(role_id) = cursor {
                if cleared.contains(&role_id) {
                    break;
                }
                if let Some(pos) = walk.iter().position(|&r| r == role_id) {
                    let mut cycle = walk[pos..].to_vec();
                    cycle.push(role_id);
                    return Err(GraphError::RoleHierarchyCycle(cycle));
                }
                walk.push(role_id);
                cursor = self.role(role_id)?.parent_role_id;
            }

            cleared.extend(walk);
        }

        Ok(())
    }

    /// Look up a role
    pub fn role(&self, id: RoleId) -> Result<&RoleNode> {
        self.roles
            .get(&id)
            .ok_or_else(|| NotFound::Role(id).into())
    }

    /// Look up a user
    pub fn user(&self, id: UserId) -> Result<&UserSubject> {
        self.users
            .get(&id)
            .ok_or_else(|| NotFound::User(id).into())
    }

    /// Look up a permission id by name
    pub fn permission_id(&self, name: &str) -> Result<PermissionId> {
        self.permission_ids
            .get(name)
            .copied()
            .ok_or_else(|| NotFound::PermissionName(name.to_string()).into())
    }

    /// Resolve a subject reference to a [`Subject`]
    pub fn subject(&self, subject_type: SubjectType, subject_id: u64) -> Result<Subject<'_>> {
        match subject_type {
            SubjectType::User => Ok(Subject::User(self.user(UserId(subject_id))?)),
            SubjectType::Role => {
                let role = self.role(RoleId(subject_id))?;
                Ok(Subject::Role(role.id))
            }
        }
    }

    /// The role itself followed by each ancestor, nearest first
    pub fn ancestors(&self, role_id: RoleId) -> Result<Vec<RoleId>> {
        let mut chain = Vec::new();
        let mut cursor = Some(role_id);
        while let Some(id) = cursor {
            chain.push(id);
            cursor = self.role(id)?.parent_role_id;
        }
        Ok(chain)
    }

    /// Decide whether the subject holds `permission_name`, and why
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown subject, an unknown permission name (unless
    /// the subject is a super-admin), or a user assigned an unknown role.
    pub fn resolve(
        &self,
        subject_type: SubjectType,
        subject_id: u64,
        permission_name: &str,
    ) -> Result<Resolution> {
        let subject = self.subject(subject_type, subject_id)?;
        if subject.is_super_admin() {
            return Ok(Resolution::granted(PathStep::SuperAdmin));
        }

        let permission = self.permission_id(permission_name)?;
        self.resolve_subject(&subject, permission)
    }

    /// Decide whether `subject` holds `permission`
    pub fn resolve_subject(
        &self,
        subject: &Subject<'_>,
        permission: PermissionId,
    ) -> Result<Resolution> {
        if subject.is_super_admin() {
            return Ok(Resolution::granted(PathStep::SuperAdmin));
        }

        let roles = subject.role_set();
        let mut chains = Vec::with_capacity(roles.len());
        for &role_id in &roles {
            chains.push(self.ancestors(role_id)?);
        }

        for &role_id in &roles {
            if self.holds_directly(role_id, permission) {
                return Ok(Resolution::granted(PathStep::Direct { role_id }));
            }
        }

        for chain in &chains {
            let role_id = chain[0];
            if let Some(&ancestor_role_id) = chain
                .iter()
                .skip(1)
                .find(|&&ancestor| self.holds_directly(ancestor, permission))
            {
                return Ok(Resolution::granted(PathStep::Inherited {
                    role_id,
                    ancestor_role_id,
                }));
            }
        }

        Ok(Resolution::denied())
    }

    /// Every permission the subject holds, ascending by id
    pub fn effective_permissions(
        &self,
        subject_type: SubjectType,
        subject_id: u64,
    ) -> Result<Vec<EffectivePermission>> {
        let subject = self.subject(subject_type, subject_id)?;
        let mut held = Vec::new();

        for (&permission_id, name) in &self.permission_names {
            let resolution = self.resolve_subject(&subject, permission_id)?;
            if resolution.granted {
                held.push(EffectivePermission {
                    permission_id,
                    name: name.clone(),
                    path: resolution.path,
                });
            }
        }

        Ok(held)
    }

    /// Held permissions whose direct dependencies are not all held
    ///
    /// Advisory only: an unmet dependency never revokes a grant.
    pub fn unmet_dependencies(
        &self,
        subject_type: SubjectType,
        subject_id: u64,
        graph: &PermissionGraph,
    ) -> Result<Vec<UnmetDependency>> {
        let held: BTreeSet<PermissionId> = self
            .effective_permissions(subject_type, subject_id)?
            .into_iter()
            .map(|p| p.permission_id)
            .collect();

        let mut unmet = Vec::new();
        for &permission_id in &held {
            let missing: Vec<PermissionId> = graph
                .edges_from(permission_id)?
                .into_iter()
                .filter(|dep| !held.contains(dep))
                .collect();
            if !missing.is_empty() {
                unmet.push(UnmetDependency {
                    permission_id,
                    missing,
                });
            }
        }

        Ok(unmet)
    }

    fn holds_directly(&self, role_id: RoleId, permission: PermissionId) -> bool {
        self.roles
            .get(&role_id)
            .map_or(false, |role| role.direct_permission_ids.contains(&permission))
    }
}
