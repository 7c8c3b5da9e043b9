use crate::core::model::{group_display_name, Note, WorkspaceNode, PLANS_GROUP};
use std::path::PathBuf;

/// Stable identity of a foldable or selectable row, independent of its
/// position in the display list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Workspace(PathBuf),
    Group { workspace: String, name: String },
    Note(PathBuf),
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Workspace(WorkspaceNode),
    /// `name` is the full group key (`plans/x`, `current/.archive`).
    Group {
        name: String,
        workspace: String,
        child_count: usize,
    },
    Note(Note),
    /// A labelled separator is a section header.
    Separator { label: Option<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayNode {
    pub kind: NodeKind,
    pub depth: usize,
    pub prefix: String,
    pub jump_key: Option<char>,
}

impl DisplayNode {
    pub fn new(kind: NodeKind, depth: usize) -> Self {
        Self {
            kind,
            depth,
            prefix: String::new(),
            jump_key: None,
        }
    }

    pub fn id(&self) -> Option<NodeId> {
        match &self.kind {
            NodeKind::Workspace(ws) => Some(NodeId::Workspace(ws.path.clone())),
            NodeKind::Group {
                name, workspace, ..
            } => Some(NodeId::Group {
                workspace: workspace.clone(),
                name: name.clone(),
            }),
            NodeKind::Note(note) => Some(NodeId::Note(note.path.clone())),
            NodeKind::Separator { .. } => None,
        }
    }

    pub fn is_foldable(&self) -> bool {
        matches!(self.kind, NodeKind::Workspace(_) | NodeKind::Group { .. })
    }

    pub fn is_separator(&self) -> bool {
        matches!(self.kind, NodeKind::Separator { .. })
    }

    pub fn note(&self) -> Option<&Note> {
        match &self.kind {
            NodeKind::Note(note) => Some(note),
            _ => None,
        }
    }

    pub fn workspace(&self) -> Option<&WorkspaceNode> {
        match &self.kind {
            NodeKind::Workspace(ws) => Some(ws),
            _ => None,
        }
    }

    /// Name of the workspace this row belongs to.
    pub fn owner(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Workspace(ws) => Some(&ws.name),
            NodeKind::Group { workspace, .. } => Some(workspace),
            NodeKind::Note(note) => Some(&note.workspace),
            NodeKind::Separator { .. } => None,
        }
    }

    /// Group key a paste or create at this row lands in. Workspaces have none.
    pub fn group(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Group { name, .. } => Some(name),
            NodeKind::Note(note) => Some(&note.group),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Workspace(ws) => ws.name.clone(),
            NodeKind::Group { name, .. } if name == PLANS_GROUP => PLANS_GROUP.to_string(),
            NodeKind::Group { name, .. } => group_display_name(name).to_string(),
            NodeKind::Note(note) => note.title.clone(),
            NodeKind::Separator { label } => label.clone().unwrap_or_default(),
        }
    }
}
