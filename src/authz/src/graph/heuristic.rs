//! Dependency suggestions from permission naming conventions
//!
//! Within a module, some actions only make sense together with others:
//! deleting a record requires being able to edit and view it, and so on.

use serde::{Deserialize, Serialize};

use super::store::{EdgeInsert, PermissionGraph};
use crate::error::{GraphError, Result};
use crate::types::{DependencyEdge, PermissionId};

/// Prerequisite types for a permission type, in suggestion order
pub fn prerequisite_types(permission_type: &str) -> &'static [&'static str] {
    match permission_type.to_ascii_lowercase().as_str() {
        "delete" => &["edit", "view"],
        "edit" => &["view"],
        "manage" => &["view", "edit"],
        _ => &[],
    }
}

/// Outcome of an auto-resolve run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoResolveReport {
    /// Edges created by this run
    pub added: Vec<DependencyEdge>,

    /// Suggested edges that were already present
    pub already_exists: Vec<DependencyEdge>,

    /// Suggested edges the cycle guard rejected
    pub skipped_due_to_cycle: Vec<DependencyEdge>,
}

impl AutoResolveReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: AutoResolveReport) {
        self.added.extend(other.added);
        self.already_exists.extend(other.already_exists);
        self.skipped_due_to_cycle.extend(other.skipped_due_to_cycle);
    }

    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
    }
}

/// Every same-module permission whose type is a prerequisite of `id`'s type
fn candidates(graph: &PermissionGraph, id: PermissionId) -> Result<Vec<PermissionId>> {
    let node = graph.node(id)?;
    let siblings = graph.module_siblings(id)?;

    Ok(prerequisite_types(&node.permission_type)
        .iter()
        .flat_map(|wanted| {
            siblings
                .iter()
                .filter(move |s| s.permission_type.eq_ignore_ascii_case(wanted))
                .map(|s| s.id)
        })
        .collect())
}

/// Suggest dependencies `id` is missing
pub fn suggest(graph: &PermissionGraph, id: PermissionId) -> Result<Vec<PermissionId>> {
    let existing = graph.edges_from(id)?;
    Ok(candidates(graph, id)?
        .into_iter()
        .filter(|candidate| !existing.contains(candidate))
        .collect())
}

/// Create every suggested dependency of `id`
///
/// Edges the cycle guard rejects are reported under `skipped_due_to_cycle`.
/// Running this twice on an unchanged graph adds nothing the second time.
pub fn auto_resolve(graph: &mut PermissionGraph, id: PermissionId) -> Result<AutoResolveReport> {
    let mut report = AutoResolveReport::default();

    for candidate in candidates(graph, id)? {
        let edge = DependencyEdge {
            from: id,
            to: candidate,
        };
        match graph.add_edge(id, candidate) {
            Ok(EdgeInsert::Added) => report.added.push(edge),
            Ok(EdgeInsert::AlreadyExists) => report.already_exists.push(edge),
            Err(GraphError::CircularDependency { .. }) => report.skipped_due_to_cycle.push(edge),
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

/// Run [`auto_resolve`] for every permission in ascending id order
pub fn auto_resolve_all(graph: &mut PermissionGraph) -> Result<AutoResolveReport> {
    let ids: Vec<PermissionId> = graph.nodes().iter().map(|n| n.id).collect();
    let mut report = AutoResolveReport::default();
    for id in ids {
        report.merge(auto_resolve(graph, id)?);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PermissionNode;

    fn graph() -> PermissionGraph {
        PermissionGraph::from_snapshot(
            vec![
                PermissionNode::from_name(1, "users.view"),
                PermissionNode::from_name(2, "users.edit"),
                PermissionNode::from_name(3, "users.delete"),
                PermissionNode::from_name(4, "users.manage"),
                PermissionNode::from_name(5, "posts.view"),
                PermissionNode::from_name(6, "users.export"),
            ],
            vec![DependencyEdge::new(3, 2)],
        )
        .unwrap()
    }

    #[test]
    fn test_prerequisite_table() {
        assert_eq!(prerequisite_types("delete"), &["edit", "view"]);
        assert_eq!(prerequisite_types("EDIT"), &["view"]);
        assert_eq!(prerequisite_types("manage"), &["view", "edit"]);
        assert!(prerequisite_types("view").is_empty());
        assert!(prerequisite_types("export").is_empty());
    }

    #[test]
    fn test_suggest_excludes_existing_and_other_modules() {
        let graph = graph();
        assert_eq!(suggest(&graph, PermissionId(3)).unwrap(), vec![PermissionId(1)]);
        assert_eq!(
            suggest(&graph, PermissionId(4)).unwrap(),
            vec![PermissionId(1), PermissionId(2)]
        );
        assert!(suggest(&graph, PermissionId(6)).unwrap().is_empty());
        assert!(suggest(&graph, PermissionId(5)).unwrap().is_empty());
        assert!(suggest(&graph, PermissionId(50)).is_err());
    }

    #[test]
    fn test_auto_resolve_is_idempotent() {
        let mut graph = graph();

        let first = auto_resolve(&mut graph, PermissionId(3)).unwrap();
        assert_eq!(first.added, vec![DependencyEdge::new(3, 1)]);
        assert_eq!(first.already_exists, vec![DependencyEdge::new(3, 2)]);
        assert!(first.skipped_due_to_cycle.is_empty());

        let second = auto_resolve(&mut graph, PermissionId(3)).unwrap();
        assert!(second.is_noop());
        assert_eq!(second.already_exists.len(), 2);
    }

    #[test]
    fn test_auto_resolve_reports_cycles() {
        let mut graph = graph();
        // view depends on delete, so delete -> view would close a loop
        graph.remove_edge(PermissionId(3), PermissionId(2)).unwrap();
        graph.add_edge(PermissionId(1), PermissionId(3)).unwrap();

        let report = auto_resolve(&mut graph, PermissionId(3)).unwrap();
        assert_eq!(report.added, vec![DependencyEdge::new(3, 2)]);
        assert_eq!(report.skipped_due_to_cycle, vec![DependencyEdge::new(3, 1)]);
    }

    #[test]
    fn test_auto_resolve_all() {
        let mut graph = graph();
        let report = auto_resolve_all(&mut graph).unwrap();
        // edit->view, delete->view, manage->view, manage->edit
        assert_eq!(report.added.len(), 4);
        assert_eq!(report.already_exists.len(), 1);
        assert!(auto_resolve_all(&mut graph).unwrap().is_noop());
    }
}
