//! Narrow interfaces the browser consumes. Implementations must be shareable
//! across the worker threads the command runner spawns.

use crate::core::errors::{BatchResult, LaunchError, NotebookResult, SearchError};
use crate::core::model::{Note, WorkspaceNode};
use std::path::{Path, PathBuf};

pub trait WorkspaceSource: Send + Sync {
    /// Every registered workspace, pre-ordered and depth-annotated.
    fn all(&self) -> NotebookResult<Vec<WorkspaceNode>>;
}

pub trait NoteSource: Send + Sync {
    /// Notes owned by one workspace.
    fn list_all_items(
        &self,
        context: &WorkspaceNode,
        include_archived: bool,
        include_artifacts: bool,
    ) -> NotebookResult<Vec<Note>>;

    /// Notes in the global scratch area.
    fn list_global_items(
        &self,
        include_archived: bool,
        include_artifacts: bool,
    ) -> NotebookResult<Vec<Note>>;

    /// Directories a content search should cover for the given workspaces.
    fn note_dirs(&self, workspaces: &[WorkspaceNode]) -> Vec<PathBuf>;
}

/// Where a new or moved note should land. `workspace == None` means global.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub workspace: Option<String>,
    pub group: String,
}

impl Placement {
    pub fn new(workspace: Option<String>, group: impl Into<String>) -> Self {
        Self {
            workspace,
            group: group.into(),
        }
    }
}

pub trait NoteService: Send + Sync {
    fn create_note(&self, placement: &Placement, note_type: &str, title: &str)
        -> NotebookResult<Note>;

    /// Returns the note's new path.
    fn rename_note(&self, path: &Path, new_title: &str) -> NotebookResult<PathBuf>;

    fn delete_notes(&self, paths: &[PathBuf]) -> BatchResult<()>;

    /// Moves each note into its group's `.archive` directory. Returns the
    /// archived source paths.
    fn archive_notes(&self, paths: &[PathBuf]) -> BatchResult<Vec<PathBuf>>;

    /// Moves the whole `plans/<plan>` directory of a workspace into
    /// `plans/.archive/`. Returns the new directory.
    fn archive_plan(&self, workspace: Option<&str>, plan: &str) -> NotebookResult<PathBuf>;

    /// Returns the new paths, in input order.
    fn move_notes(&self, paths: &[PathBuf], dest: &Placement) -> BatchResult<Vec<PathBuf>>;

    fn copy_notes(&self, paths: &[PathBuf], dest: &Placement) -> BatchResult<Vec<PathBuf>>;
}

pub trait ContentSearch: Send + Sync {
    fn grep(&self, query: &str, dirs: &[PathBuf]) -> Result<Vec<PathBuf>, SearchError>;
}

pub trait EditorLauncher: Send + Sync {
    /// Runs the editor in the foreground. The caller must have released the
    /// terminal first.
    fn open(&self, path: &Path) -> Result<(), LaunchError>;
}

pub trait TerminalMultiplexer: Send + Sync {
    fn is_available(&self) -> bool;
    fn split_and_open(&self, path: &Path) -> Result<(), LaunchError>;
}
