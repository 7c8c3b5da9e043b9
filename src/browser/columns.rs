//! Table-view columns and their persisted visibility.

use crate::core::model::Note;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Type,
    Tags,
    Created,
    Modified,
    Workspace,
    Path,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Type,
        Column::Tags,
        Column::Created,
        Column::Modified,
        Column::Workspace,
        Column::Path,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Tags => "tags",
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Workspace => "workspace",
            Self::Path => "path",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.name() == name)
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Type => "TYPE",
            Self::Tags => "TAGS",
            Self::Created => "CREATED",
            Self::Modified => "MODIFIED",
            Self::Workspace => "WORKSPACE",
            Self::Path => "PATH",
        }
    }

    /// Inclusive width bounds in terminal columns.
    pub fn width_bounds(self) -> (usize, usize) {
        match self {
            Self::Type => (4, 10),
            Self::Tags => (4, 24),
            Self::Created | Self::Modified => (10, 16),
            Self::Workspace => (9, 20),
            Self::Path => (4, 48),
        }
    }

    pub fn visible_by_default(self) -> bool {
        matches!(self, Self::Type | Self::Tags | Self::Created)
    }

    pub fn cell(self, note: &Note) -> String {
        match self {
            Self::Type => note.note_type.clone(),
            Self::Tags => note.tags.join(", "),
            Self::Created => note.created_at.format("%Y-%m-%d").to_string(),
            Self::Modified => note.modified_at.format("%Y-%m-%d %H:%M").to_string(),
            Self::Workspace => note.workspace.clone(),
            Self::Path => note.path.display().to_string(),
        }
    }
}

/// Per-column visibility, stored as `{"type": true, ...}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSettings {
    visible: BTreeMap<Column, bool>,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            visible: Column::ALL
                .into_iter()
                .map(|column| (column, column.visible_by_default()))
                .collect(),
        }
    }
}

impl ColumnSettings {
    /// Reads `path`. A missing or malformed file yields the defaults; unknown
    /// keys are ignored and missing keys keep their default.
    pub fn load(path: &Path) -> Self {
        let mut settings = Self::default();
        let Ok(content) = fs::read_to_string(path) else {
            return settings;
        };
        let stored: BTreeMap<String, bool> = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring malformed column settings: {err}");
                return settings;
            }
        };
        for (name, visible) in stored {
            if let Some(column) = Column::from_name(&name) {
                settings.visible.insert(column, visible);
            }
        }
        settings
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored: BTreeMap<&str, bool> = self
            .visible
            .iter()
            .map(|(column, visible)| (column.name(), *visible))
            .collect();
        let data = serde_json::to_string_pretty(&stored).unwrap_or_else(|_| "{}".to_string());
        fs::write(path, data)
    }

    pub fn is_visible(&self, column: Column) -> bool {
        self.visible.get(&column).copied().unwrap_or(false)
    }

    pub fn toggle(&mut self, column: Column) {
        let visible = self.is_visible(column);
        self.visible.insert(column, !visible);
    }

    pub fn visible_columns(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|column| self.is_visible(*column))
            .collect()
    }
}
