use crate::core::errors::{NotebookError, NotebookResult};
use crate::core::model::{WorkspaceKind, WorkspaceNode};
use crate::core::notebook::FsNotebook;
use crate::core::sources::WorkspaceSource;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Workspace registry read from a JSON array of [`WorkspaceNode`]s.
///
/// When the registry file does not exist, every directory under the
/// notebook's `workspaces/` folder is reported as a standalone project.
pub struct JsonWorkspaceRegistry {
    path: PathBuf,
    notebook: FsNotebook,
}

impl JsonWorkspaceRegistry {
    pub fn new<P: Into<PathBuf>>(path: P, notebook: FsNotebook) -> Self {
        Self {
            path: path.into(),
            notebook,
        }
    }

    fn discover(&self) -> NotebookResult<Vec<WorkspaceNode>> {
        Ok(self
            .notebook
            .workspace_names()?
            .into_iter()
            .map(|name| {
                let path = self.notebook.workspace_dir(Some(&name));
                WorkspaceNode::new(name, path, WorkspaceKind::Standalone)
            })
            .collect())
    }
}

impl WorkspaceSource for JsonWorkspaceRegistry {
    fn all(&self) -> NotebookResult<Vec<WorkspaceNode>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no registry, discovering workspaces");
            return self.discover();
        }
        let content =
            fs::read_to_string(&self.path).map_err(|err| NotebookError::io(&self.path, err))?;
        let nodes: Vec<WorkspaceNode> =
            serde_json::from_str(&content).map_err(|source| NotebookError::Registry {
                path: self.path.clone(),
                source,
            })?;
        Ok(annotate_depths(nodes))
    }
}

/// Fills in depths the registry left at zero from the parent back-references.
/// Parents must precede their children.
pub fn annotate_depths(mut nodes: Vec<WorkspaceNode>) -> Vec<WorkspaceNode> {
    let mut depths: HashMap<PathBuf, usize> = HashMap::new();
    for node in &mut nodes {
        let parent = node
            .parent_project_path
            .as_ref()
            .or(node.parent_ecosystem_path.as_ref());
        if node.depth == 0 {
            if let Some(parent_depth) = parent.and_then(|p| depths.get(p)) {
                node.depth = parent_depth + 1;
            }
        }
        depths.insert(node.path.clone(), node.depth);
    }
    nodes
}
