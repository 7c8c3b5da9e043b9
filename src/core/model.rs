use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the synthetic workspace that holds notes outside any project.
pub const GLOBAL_WORKSPACE: &str = "global";

/// Group that new notes land in when nothing more specific is known.
pub const DEFAULT_GROUP: &str = "current";

/// Group used by the inbox placement rules.
pub const INBOX_GROUP: &str = "inbox";

pub const PLANS_GROUP: &str = "plans";
pub const ARCHIVE_DIR: &str = ".archive";

/// A single note snapshot as reported by a note source.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub path: PathBuf,
    pub title: String,
    pub note_type: String,
    pub group: String,
    pub workspace: String,
    pub branch: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub has_todos: bool,
    pub is_archived: bool,
    pub is_artifact: bool,
    pub plan_ref: Option<String>,
}

impl Note {
    pub fn is_global(&self) -> bool {
        self.workspace == GLOBAL_WORKSPACE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceKind {
    Standalone,
    StandaloneWorktree,
    EcosystemRoot,
    EcosystemWorktree,
    EcosystemSubProject,
    EcosystemSubProjectWorktree,
    EcosystemWorktreeSubProjectWorktree,
}

impl WorkspaceKind {
    pub fn is_worktree(self) -> bool {
        matches!(
            self,
            Self::StandaloneWorktree
                | Self::EcosystemWorktree
                | Self::EcosystemSubProjectWorktree
                | Self::EcosystemWorktreeSubProjectWorktree
        )
    }

    pub fn is_ecosystem(self) -> bool {
        matches!(self, Self::EcosystemRoot | Self::EcosystemWorktree)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Standalone => "project",
            Self::StandaloneWorktree => "worktree",
            Self::EcosystemRoot => "ecosystem",
            Self::EcosystemWorktree => "ecosystem worktree",
            Self::EcosystemSubProject => "sub-project",
            Self::EcosystemSubProjectWorktree => "sub-project worktree",
            Self::EcosystemWorktreeSubProjectWorktree => "ecosystem worktree sub-project",
        }
    }
}

/// A registered workspace. The registry reports these as a pre-ordered,
/// depth-annotated forest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: WorkspaceKind,
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub parent_ecosystem_path: Option<PathBuf>,
    #[serde(default)]
    pub parent_project_path: Option<PathBuf>,
    #[serde(default)]
    pub root_ecosystem_path: Option<PathBuf>,
}

impl WorkspaceNode {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: WorkspaceKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            depth: 0,
            parent_ecosystem_path: None,
            parent_project_path: None,
            root_ecosystem_path: None,
        }
    }

    /// The synthetic `global` node. It has no filesystem path.
    pub fn global() -> Self {
        Self::new(GLOBAL_WORKSPACE, PathBuf::new(), WorkspaceKind::Standalone)
    }

    pub fn is_global(&self) -> bool {
        self.name == GLOBAL_WORKSPACE && self.path.as_os_str().is_empty()
    }

    /// True when `self` lives strictly below `ancestor` on disk.
    pub fn is_descendant_of(&self, ancestor: &WorkspaceNode) -> bool {
        if ancestor.path.as_os_str().is_empty() || self.path == ancestor.path {
            return false;
        }
        normalize_path(&self.path).starts_with(normalize_path(&ancestor.path))
    }
}

/// Lexically normalize a path: drop `.` components and resolve `..` where
/// possible. No filesystem access.
pub fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub fn is_plan_group(group: &str) -> bool {
    group
        .strip_prefix("plans/")
        .map(|rest| !rest.is_empty())
        .unwrap_or(false)
}

pub fn is_archive_group(group: &str) -> bool {
    group.ends_with("/.archive") || group.contains("/.archive/")
}

/// Group an archive group hangs under: `current/.archive` → `current`,
/// `plans/.archive/old` → `plans`.
pub fn archive_parent(group: &str) -> Option<&str> {
    let idx = group.find("/.archive")?;
    let rest = &group[idx + "/.archive".len()..];
    if rest.is_empty() || rest.starts_with('/') {
        Some(&group[..idx])
    } else {
        None
    }
}

/// Display name for a group: plan prefixes and archive parents are stripped.
pub fn group_display_name(group: &str) -> &str {
    if is_archive_group(group) {
        if let Some(parent) = archive_parent(group) {
            return group[parent.len()..].trim_start_matches('/');
        }
    }
    group.strip_prefix("plans/").unwrap_or(group)
}
