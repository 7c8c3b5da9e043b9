use crate::browser::node::{DisplayNode, NodeId, NodeKind};
use crate::core::model::WorkspaceNode;
use std::collections::HashSet;

/// Collapsed rows, keyed by identity so folds survive reloads and resorts.
/// Entries for rows that no longer exist are left in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FoldState {
    collapsed: HashSet<NodeId>,
}

impl FoldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: &NodeId) -> bool {
        self.collapsed.contains(id)
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.collapsed.iter()
    }

    pub fn toggle(&mut self, id: &NodeId) {
        if !self.collapsed.remove(id) {
            self.collapsed.insert(id.clone());
        }
    }

    pub fn open(&mut self, id: &NodeId) {
        self.collapsed.remove(id);
    }

    pub fn close(&mut self, id: &NodeId) {
        self.collapsed.insert(id.clone());
    }

    /// Collapses every foldable row in `nodes`.
    pub fn close_all(&mut self, nodes: &[DisplayNode]) {
        self.collapsed.extend(
            nodes
                .iter()
                .filter(|node| node.is_foldable())
                .filter_map(DisplayNode::id),
        );
    }

    pub fn open_all(&mut self) {
        self.collapsed.clear();
    }

    /// Collapses the row at `index` and every foldable row below it.
    pub fn close_recursive(&mut self, nodes: &[DisplayNode], index: usize) {
        let Some(start) = nodes.get(index) else {
            return;
        };
        if let Some(id) = start.id().filter(|_| start.is_foldable()) {
            self.collapsed.insert(id);
        }
        for node in nodes[index + 1..]
            .iter()
            .take_while(|node| node.depth > start.depth)
        {
            if node.is_foldable() {
                if let Some(id) = node.id() {
                    self.collapsed.insert(id);
                }
            }
        }
    }

    /// Expands the row at `index` and everything it owns. Collapsed
    /// descendants are not in `nodes`, so ownership is decided by name:
    /// a workspace owns its groups and the workspaces below it on disk, a
    /// group owns the groups nested under `name/`.
    pub fn open_recursive(
        &mut self,
        nodes: &[DisplayNode],
        index: usize,
        workspaces: &[WorkspaceNode],
    ) {
        let Some(node) = nodes.get(index) else {
            return;
        };
        match &node.kind {
            NodeKind::Workspace(ws) => {
                let owned: HashSet<&str> = workspaces
                    .iter()
                    .filter(|other| other.is_descendant_of(ws))
                    .map(|other| other.name.as_str())
                    .chain(std::iter::once(ws.name.as_str()))
                    .collect();
                let owned_paths: HashSet<&std::path::Path> = workspaces
                    .iter()
                    .filter(|other| other.is_descendant_of(ws))
                    .map(|other| other.path.as_path())
                    .collect();
                self.collapsed.retain(|id| match id {
                    NodeId::Workspace(path) => {
                        path != &ws.path && !owned_paths.contains(path.as_path())
                    }
                    NodeId::Group { workspace, .. } => !owned.contains(workspace.as_str()),
                    NodeId::Note(_) => true,
                });
            }
            NodeKind::Group {
                name, workspace, ..
            } => {
                let nested = format!("{name}/");
                self.collapsed.retain(|id| match id {
                    NodeId::Group {
                        workspace: owner,
                        name: other,
                    } => owner != workspace || (other != name && !other.starts_with(&nested)),
                    _ => true,
                });
            }
            _ => {}
        }
    }

    pub fn toggle_recursive(
        &mut self,
        nodes: &[DisplayNode],
        index: usize,
        workspaces: &[WorkspaceNode],
    ) {
        let Some(id) = nodes.get(index).and_then(DisplayNode::id) else {
            return;
        };
        if self.is_collapsed(&id) {
            self.open_recursive(nodes, index, workspaces);
        } else {
            self.close_recursive(nodes, index);
        }
    }
}
