use crate::core::model::Note;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// A selected plan, identified by its owning workspace and full group key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanGroupKey {
    pub workspace: String,
    pub group: String,
}

impl PlanGroupKey {
    pub fn new(workspace: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            group: group.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipboardMode {
    Cut,
    Copy,
}

impl ClipboardMode {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Cut => "Moved",
            Self::Copy => "Copied",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clipboard {
    pub paths: Vec<PathBuf>,
    pub mode: ClipboardMode,
}

/// Selected notes and plans plus the cut/copy clipboard. Only ever holds
/// paths from the latest note snapshot; see [`SelectionStore::purge`].
#[derive(Clone, Debug, Default)]
pub struct SelectionStore {
    notes: BTreeSet<PathBuf>,
    plans: BTreeSet<PlanGroupKey>,
    clipboard: Option<Clipboard>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_note(&mut self, path: &Path) {
        if !self.notes.remove(path) {
            self.notes.insert(path.to_path_buf());
        }
    }

    pub fn toggle_plan(&mut self, key: PlanGroupKey) {
        if !self.plans.remove(&key) {
            self.plans.insert(key);
        }
    }

    pub fn select_notes<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.notes.extend(paths);
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.notes.contains(path)
    }

    pub fn is_plan_selected(&self, key: &PlanGroupKey) -> bool {
        self.plans.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.plans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len() + self.plans.len()
    }

    /// Selected note paths in sorted order.
    pub fn notes(&self) -> Vec<PathBuf> {
        self.notes.iter().cloned().collect()
    }

    pub fn plans(&self) -> Vec<PlanGroupKey> {
        self.plans.iter().cloned().collect()
    }

    /// Clears the selection; the clipboard is kept.
    pub fn clear(&mut self) {
        self.notes.clear();
        self.plans.clear();
    }

    pub fn set_clipboard(&mut self, paths: Vec<PathBuf>, mode: ClipboardMode) {
        self.clipboard = Some(Clipboard { paths, mode });
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard = None;
    }

    /// Drops the first `moved` cut paths after a paste, or the whole
    /// clipboard once nothing is left. A copy clipboard is kept.
    pub fn consume_cut(&mut self, moved: usize) {
        let Some(clip) = self.clipboard.as_mut() else {
            return;
        };
        if clip.mode != ClipboardMode::Cut {
            return;
        }
        clip.paths.drain(..moved.min(clip.paths.len()));
        if clip.paths.is_empty() {
            self.clipboard = None;
        }
    }

    /// True when `path` is waiting to be moved by a paste.
    pub fn is_cut(&self, path: &Path) -> bool {
        self.clipboard.as_ref().is_some_and(|clip| {
            clip.mode == ClipboardMode::Cut && clip.paths.iter().any(|p| p == path)
        })
    }

    /// Drops every entry that no longer refers to a note in `notes`.
    pub fn purge(&mut self, notes: &[Note]) {
        let known: HashSet<&Path> = notes.iter().map(|note| note.path.as_path()).collect();
        let groups: HashSet<(&str, &str)> = notes
            .iter()
            .map(|note| (note.workspace.as_str(), note.group.as_str()))
            .collect();
        self.notes.retain(|path| known.contains(path.as_path()));
        self.plans
            .retain(|key| groups.contains(&(key.workspace.as_str(), key.group.as_str())));
        if let Some(clip) = self.clipboard.as_mut() {
            clip.paths.retain(|path| known.contains(path.as_path()));
            if clip.paths.is_empty() {
                self.clipboard = None;
            }
        }
    }
}
