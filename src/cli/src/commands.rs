//! Subcommands and their execution against the permission service

use anyhow::{Context, Result};
use clap::Subcommand;
use permgraph_authz::graph::Direction;
use permgraph_authz::{ClosureQuery, PermissionId, PermissionService, SubjectType};
use serde_json::{json, Value};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the dependency neighbourhood of a permission
    Closure {
        /// Permission at the centre of the view
        permission_id: u64,

        /// dependencies, dependents or both
        #[arg(short, long, default_value = "dependencies")]
        direction: Direction,

        /// Depth bound (defaults to engine.default_max_depth)
        #[arg(long)]
        depth: Option<usize>,

        /// Only display permissions of this module
        #[arg(long)]
        module: Option<String>,

        /// Only display permissions of this type
        #[arg(long = "type")]
        permission_type: Option<String>,
    },

    /// Shortest dependency chain between two permissions
    Path { from: u64, to: u64 },

    /// Make a permission depend on another
    Add { permission_id: u64, depends_on_id: u64 },

    /// Remove a dependency
    Remove { permission_id: u64, depends_on_id: u64 },

    /// Suggest missing dependencies from naming conventions
    Suggest { permission_id: u64 },

    /// Create suggested dependencies for one permission, or all with --all
    AutoResolve {
        #[arg(required_unless_present = "all")]
        permission_id: Option<u64>,

        #[arg(long, conflicts_with = "permission_id")]
        all: bool,
    },

    /// Report every dependency cycle; exits non-zero when any exist
    CheckCycles,

    /// Permissions ordered dependencies-first
    Order,

    /// Summary counts over the graph
    Stats,

    /// Decide whether a subject holds a permission
    Resolve {
        /// user or role
        subject_type: SubjectType,
        subject_id: u64,
        permission: String,
    },

    /// List every permission a subject holds
    Effective {
        subject_type: SubjectType,
        subject_id: u64,

        /// Report held permissions with missing dependencies instead
        #[arg(long)]
        unmet: bool,
    },
}

/// Result of a subcommand
#[derive(Debug)]
pub struct Report {
    pub body: Value,

    /// The command ran but found a problem worth a non-zero exit
    pub failed: bool,
}

impl Report {
    fn ok(body: Value) -> Self {
        Self {
            body,
            failed: false,
        }
    }
}

/// Run `command` against `service`
pub async fn execute(command: Command, service: &PermissionService) -> Result<Report> {
    let report = match command {
        Command::Closure {
            permission_id,
            direction,
            depth,
            module,
            permission_type,
        } => {
            let mut query = service
                .closure_query(PermissionId(permission_id))
                .direction(direction);
            if let Some(depth) = depth {
                query = query.max_depth(depth);
            }
            if let Some(module) = module {
                query = query.module_filter(module);
            }
            if let Some(permission_type) = permission_type {
                query = query.type_filter(permission_type);
            }
            closure(service, &query).await?
        }

        Command::Path { from, to } => {
            let path = service
                .compute_dependency_path(PermissionId(from), PermissionId(to))
                .await
                .context("Failed to compute dependency path")?;
            Report::ok(json!({ "path": path }))
        }

        Command::Add {
            permission_id,
            depends_on_id,
        } => {
            service
                .add_dependency(PermissionId(permission_id), PermissionId(depends_on_id))
                .await
                .context("Failed to add dependency")?;
            Report::ok(json!({ "added": { "from": permission_id, "to": depends_on_id } }))
        }

        Command::Remove {
            permission_id,
            depends_on_id,
        } => {
            service
                .remove_dependency(PermissionId(permission_id), PermissionId(depends_on_id))
                .await
                .context("Failed to remove dependency")?;
            Report::ok(json!({ "removed": { "from": permission_id, "to": depends_on_id } }))
        }

        Command::Suggest { permission_id } => {
            let suggestions = service.suggest(PermissionId(permission_id)).await?;
            Report::ok(json!({ "suggestions": suggestions }))
        }

        Command::AutoResolve { permission_id, all } => {
            let report = match permission_id {
                Some(id) if !all => service.auto_resolve(PermissionId(id)).await?,
                _ => service.auto_resolve_all().await?,
            };
            Report::ok(serde_json::to_value(report)?)
        }

        Command::CheckCycles => {
            let cycles = service.check_all_cycles().await?;
            Report {
                failed: !cycles.is_empty(),
                body: json!({ "cycles": cycles }),
            }
        }

        Command::Order => {
            let order = service
                .topological_order()
                .await
                .context("Graph has no topological order")?;
            Report::ok(json!({ "order": order }))
        }

        Command::Stats => Report::ok(serde_json::to_value(service.stats().await?)?),

        Command::Resolve {
            subject_type,
            subject_id,
            permission,
        } => {
            let resolution = service
                .resolve(subject_type, subject_id, &permission)
                .await
                .with_context(|| format!("Failed to resolve {} {}", subject_type, subject_id))?;
            Report::ok(serde_json::to_value(resolution)?)
        }

        Command::Effective {
            subject_type,
            subject_id,
            unmet,
        } => {
            let body = if unmet {
                json!({ "unmet": service.unmet_dependencies(subject_type, subject_id).await? })
            } else {
                json!({ "permissions": service.effective_permissions(subject_type, subject_id).await? })
            };
            Report::ok(body)
        }
    };

    Ok(report)
}

async fn closure(service: &PermissionService, query: &ClosureQuery) -> Result<Report> {
    let tree = service
        .compute_closure(query)
        .await
        .context("Failed to compute closure")?;
    Ok(Report::ok(serde_json::to_value(tree)?))
}
