//! Filesystem-backed note store.
//!
//! Layout:
//! - `<root>/global/<group>/<file>` for the global scratch area
//! - `<root>/workspaces/<name>/<group>/<file>` for registered workspaces
//!
//! The group of a note is the directory path between the workspace
//! directory and the file, e.g. `current`, `plans/x`, `current/.archive`.

use crate::core::errors::{BatchError, BatchResult, NotebookError, NotebookResult};
use crate::core::frontmatter::{self, first_heading, slugify};
use crate::core::model::{
    is_archive_group, Note, WorkspaceNode, ARCHIVE_DIR, DEFAULT_GROUP, GLOBAL_WORKSPACE,
    PLANS_GROUP,
};
use crate::core::sources::{NoteService, NoteSource, Placement};
use chrono::{DateTime, Local, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

const NOTE_EXTENSION: &str = "md";

#[derive(Clone, Debug)]
pub struct FsNotebook {
    root: PathBuf,
}

impl FsNotebook {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds a workspace's groups. `None` and `"global"` map
    /// to the global area.
    pub fn workspace_dir(&self, workspace: Option<&str>) -> PathBuf {
        match workspace {
            None => self.root.join(GLOBAL_WORKSPACE),
            Some(name) if name == GLOBAL_WORKSPACE => self.root.join(GLOBAL_WORKSPACE),
            Some(name) => self.root.join("workspaces").join(name),
        }
    }

    /// Names of the workspace directories present on disk, sorted.
    pub fn workspace_names(&self) -> NotebookResult<Vec<String>> {
        let dir = self.root.join("workspaces");
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|err| NotebookError::io(&dir, err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| NotebookError::io(&dir, err))?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if !name.starts_with('.') {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn scan(
        &self,
        workspace: &str,
        include_archived: bool,
        include_artifacts: bool,
    ) -> NotebookResult<Vec<Note>> {
        let dir = self.workspace_dir(Some(workspace));
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
        let mut notes = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !path.is_file() || is_hidden_file(&path) {
                continue;
            }
            let group = group_for(&dir, &path);
            let is_archived = is_archive_group(&group);
            if is_archived && !include_archived {
                continue;
            }
            let is_artifact = !has_note_extension(&path);
            if is_artifact && !include_artifacts {
                continue;
            }
            match read_note(&path, workspace, &group, is_archived, is_artifact) {
                Ok(note) => notes.push(note),
                Err(err) => tracing::warn!("skipping note: {err}"),
            }
        }
        Ok(notes)
    }

    fn placement_dir(&self, placement: &Placement) -> NotebookResult<PathBuf> {
        validate_group(&placement.group)?;
        Ok(self
            .workspace_dir(placement.workspace.as_deref())
            .join(&placement.group))
    }

    /// Workspace name and group of a note path inside this notebook.
    fn locate(&self, path: &Path) -> Option<(String, String)> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut components = rel.components();
        let first = components.next()?.as_os_str().to_str()?.to_string();
        let (workspace, base) = if first == GLOBAL_WORKSPACE {
            (first, self.root.join(GLOBAL_WORKSPACE))
        } else if first == "workspaces" {
            let name = components.next()?.as_os_str().to_str()?.to_string();
            let base = self.root.join("workspaces").join(&name);
            (name, base)
        } else {
            return None;
        };
        Some((workspace, group_for(&base, path)))
    }

    fn transfer(
        &self,
        paths: &[PathBuf],
        dest: &Placement,
        remove_source: bool,
    ) -> BatchResult<Vec<PathBuf>> {
        let dest_dir = self
            .placement_dir(dest)
            .map_err(|err| BatchError::new(Vec::new(), err))?;
        fs::create_dir_all(&dest_dir)
            .map_err(|err| BatchError::new(Vec::new(), NotebookError::io(&dest_dir, err)))?;
        let workspace = dest
            .workspace
            .clone()
            .unwrap_or_else(|| GLOBAL_WORKSPACE.to_string());

        let mut completed = Vec::new();
        for path in paths {
            match self.transfer_one(path, &dest_dir, &workspace, &dest.group, remove_source) {
                Ok(new_path) => completed.push(new_path),
                Err(err) => return Err(BatchError::new(completed, err)),
            }
        }
        Ok(completed)
    }

    fn transfer_one(
        &self,
        path: &Path,
        dest_dir: &Path,
        workspace: &str,
        group: &str,
        remove_source: bool,
    ) -> NotebookResult<PathBuf> {
        if !path.is_file() {
            return Err(NotebookError::NotFound(path.to_path_buf()));
        }
        if remove_source && path.parent() == Some(dest_dir) {
            return Ok(path.to_path_buf());
        }
        let file_name = path
            .file_name()
            .ok_or_else(|| NotebookError::NotFound(path.to_path_buf()))?;
        let target = unique_path(&dest_dir.join(file_name));

        if has_note_extension(path) {
            let content = fs::read_to_string(path).map_err(|err| NotebookError::io(path, err))?;
            let modified = Utc::now().to_rfc3339();
            let updated = frontmatter::rewrite(
                &content,
                &[
                    ("workspace", workspace),
                    ("group", group),
                    ("modified", modified.as_str()),
                ],
            );
            fs::write(&target, updated).map_err(|err| NotebookError::io(&target, err))?;
        } else {
            fs::copy(path, &target).map_err(|err| NotebookError::io(&target, err))?;
        }
        if remove_source {
            fs::remove_file(path).map_err(|err| NotebookError::io(path, err))?;
        }
        Ok(target)
    }
}

impl NoteSource for FsNotebook {
    fn list_all_items(
        &self,
        context: &WorkspaceNode,
        include_archived: bool,
        include_artifacts: bool,
    ) -> NotebookResult<Vec<Note>> {
        if context.is_global() {
            return self.list_global_items(include_archived, include_artifacts);
        }
        self.scan(&context.name, include_archived, include_artifacts)
    }

    fn list_global_items(
        &self,
        include_archived: bool,
        include_artifacts: bool,
    ) -> NotebookResult<Vec<Note>> {
        self.scan(GLOBAL_WORKSPACE, include_archived, include_artifacts)
    }

    fn note_dirs(&self, workspaces: &[WorkspaceNode]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        workspaces
            .iter()
            .map(|ws| self.workspace_dir(Some(&ws.name)))
            .filter(|dir| dir.is_dir() && seen.insert(dir.clone()))
            .collect()
    }
}

impl NoteService for FsNotebook {
    fn create_note(
        &self,
        placement: &Placement,
        note_type: &str,
        title: &str,
    ) -> NotebookResult<Note> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NotebookError::EmptyTitle);
        }
        let dir = self.placement_dir(placement)?;
        fs::create_dir_all(&dir).map_err(|err| NotebookError::io(&dir, err))?;

        let now = Local::now();
        let file_name = format!(
            "{}-{}.{NOTE_EXTENSION}",
            now.format("%Y%m%d"),
            slugify(title)
        );
        let path = unique_path(&dir.join(file_name));
        let workspace = placement
            .workspace
            .clone()
            .unwrap_or_else(|| GLOBAL_WORKSPACE.to_string());
        let timestamp = now.with_timezone(&Utc).to_rfc3339();

        let mut fm = frontmatter::Frontmatter::default();
        fm.set("title", title);
        fm.set("type", note_type);
        fm.set("workspace", workspace.as_str());
        fm.set("group", placement.group.as_str());
        fm.set("tags", "[]");
        fm.set("created", timestamp.as_str());
        fm.set("modified", timestamp.as_str());
        let content = format!("{}\n# {title}\n\n", fm.render());
        fs::write(&path, content).map_err(|err| NotebookError::io(&path, err))?;
        tracing::info!(path = %path.display(), "created note");

        read_note(&path, &workspace, &placement.group, false, false)
    }

    fn rename_note(&self, path: &Path, new_title: &str) -> NotebookResult<PathBuf> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Err(NotebookError::EmptyTitle);
        }
        if !path.is_file() {
            return Err(NotebookError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|err| NotebookError::io(path, err))?;
        let modified = Utc::now().to_rfc3339();
        let updated = frontmatter::rewrite(
            &content,
            &[("title", new_title), ("modified", modified.as_str())],
        );

        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let new_name = format!("{}{}.{NOTE_EXTENSION}", date_prefix(stem), slugify(new_title));
        let parent = path
            .parent()
            .ok_or_else(|| NotebookError::NotFound(path.to_path_buf()))?;
        let mut target = parent.join(new_name);
        if target != path {
            target = unique_path(&target);
        }

        fs::write(path, updated).map_err(|err| NotebookError::io(path, err))?;
        if target != path {
            fs::rename(path, &target).map_err(|err| NotebookError::io(&target, err))?;
        }
        Ok(target)
    }

    fn delete_notes(&self, paths: &[PathBuf]) -> BatchResult<()> {
        let mut completed = Vec::new();
        for path in paths {
            if let Err(err) = fs::remove_file(path) {
                return Err(BatchError::new(completed, NotebookError::io(path, err)));
            }
            completed.push(path.clone());
        }
        Ok(())
    }

    fn archive_notes(&self, paths: &[PathBuf]) -> BatchResult<Vec<PathBuf>> {
        let mut completed = Vec::new();
        for path in paths {
            if let Err(err) = archive_one(path) {
                return Err(BatchError::new(completed, err));
            }
            completed.push(path.clone());
        }
        Ok(completed)
    }

    fn archive_plan(&self, workspace: Option<&str>, plan: &str) -> NotebookResult<PathBuf> {
        validate_group(plan)?;
        let plans_dir = self.workspace_dir(workspace).join(PLANS_GROUP);
        let source = plans_dir.join(plan);
        if !source.is_dir() {
            return Err(NotebookError::NotFound(source));
        }
        let archive_dir = plans_dir.join(ARCHIVE_DIR);
        fs::create_dir_all(&archive_dir).map_err(|err| NotebookError::io(&archive_dir, err))?;
        let mut target = archive_dir.join(plan);
        if target.exists() {
            let suffix = Local::now().format("%Y%m%d-%H%M%S");
            target = archive_dir.join(format!("{plan}-{suffix}"));
        }
        if target.exists() {
            return Err(NotebookError::AlreadyExists(target));
        }
        fs::rename(&source, &target).map_err(|err| NotebookError::io(&target, err))?;
        tracing::info!(plan, target = %target.display(), "archived plan");
        Ok(target)
    }

    fn move_notes(&self, paths: &[PathBuf], dest: &Placement) -> BatchResult<Vec<PathBuf>> {
        self.transfer(paths, dest, true)
    }

    fn copy_notes(&self, paths: &[PathBuf], dest: &Placement) -> BatchResult<Vec<PathBuf>> {
        self.transfer(paths, dest, false)
    }
}

impl FsNotebook {
    /// Re-reads a single note; used after mutations that return only paths.
    pub fn load_note(&self, path: &Path) -> NotebookResult<Note> {
        let (workspace, group) = self
            .locate(path)
            .ok_or_else(|| NotebookError::NotFound(path.to_path_buf()))?;
        read_note(
            path,
            &workspace,
            &group,
            is_archive_group(&group),
            !has_note_extension(path),
        )
    }
}

fn archive_one(path: &Path) -> NotebookResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| NotebookError::NotFound(path.to_path_buf()))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| NotebookError::NotFound(path.to_path_buf()))?;
    if !path.is_file() {
        return Err(NotebookError::NotFound(path.to_path_buf()));
    }
    let archive_dir = parent.join(ARCHIVE_DIR);
    fs::create_dir_all(&archive_dir).map_err(|err| NotebookError::io(&archive_dir, err))?;
    let target = unique_path(&archive_dir.join(file_name));
    fs::rename(path, &target).map_err(|err| NotebookError::io(&target, err))
}

fn read_note(
    path: &Path,
    workspace: &str,
    group: &str,
    is_archived: bool,
    is_artifact: bool,
) -> NotebookResult<Note> {
    let metadata = fs::metadata(path).map_err(|err| NotebookError::io(path, err))?;
    let file_modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    let file_created = metadata
        .created()
        .map(DateTime::<Utc>::from)
        .unwrap_or(file_modified);
    let file_stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();

    if is_artifact {
        return Ok(Note {
            path: path.to_path_buf(),
            title: path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string(),
            note_type: "artifact".to_string(),
            group: group.to_string(),
            workspace: workspace.to_string(),
            branch: None,
            tags: Vec::new(),
            created_at: file_created,
            modified_at: file_modified,
            has_todos: false,
            is_archived,
            is_artifact,
            plan_ref: None,
        });
    }

    let content = fs::read_to_string(path).map_err(|err| NotebookError::io(path, err))?;
    let (fm, body) = frontmatter::parse(&content);
    let title = fm
        .get("title")
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .or_else(|| first_heading(&body))
        .unwrap_or(file_stem);

    Ok(Note {
        path: path.to_path_buf(),
        title,
        note_type: fm.get("type").unwrap_or("note").to_string(),
        group: group.to_string(),
        workspace: workspace.to_string(),
        branch: fm.get("branch").map(str::to_string).filter(|b| !b.is_empty()),
        tags: fm.list("tags"),
        created_at: fm
            .get("created")
            .and_then(parse_timestamp)
            .unwrap_or(file_created),
        modified_at: fm
            .get("modified")
            .and_then(parse_timestamp)
            .unwrap_or(file_modified),
        has_todos: body.contains("- [ ]"),
        is_archived,
        is_artifact,
        plan_ref: fm
            .get("plan_ref")
            .map(str::to_string)
            .filter(|r| !r.is_empty()),
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn group_for(base: &Path, path: &Path) -> String {
    let parent = path.parent().unwrap_or(base);
    let rel = parent.strip_prefix(base).unwrap_or(Path::new(""));
    let group = rel
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/");
    if group.is_empty() {
        DEFAULT_GROUP.to_string()
    } else {
        group
    }
}

fn validate_group(group: &str) -> NotebookResult<()> {
    let path = Path::new(group);
    let valid = !group.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(NotebookError::InvalidGroup(group.to_string()))
    }
}

fn has_note_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(NOTE_EXTENSION)
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// `20240101-` when the stem starts with an 8-digit date, else empty.
fn date_prefix(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    if bytes.len() > 9 && bytes[..8].iter().all(u8::is_ascii_digit) && bytes[8] == b'-' {
        &stem[..9]
    } else {
        ""
    }
}

/// First of `path`, `name-2.ext`, `name-3.ext`, ... that does not exist.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("note")
        .to_string();
    let ext = path.extension().and_then(|e| e.to_str()).map(str::to_string);
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    (2..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            parent.join(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_is_directory_path() {
        let base = Path::new("/nb/workspaces/a");
        assert_eq!(group_for(base, Path::new("/nb/workspaces/a/plans/x/n.md")), "plans/x");
        assert_eq!(group_for(base, Path::new("/nb/workspaces/a/n.md")), DEFAULT_GROUP);
    }

    #[test]
    fn rejects_escaping_groups() {
        assert!(validate_group("current").is_ok());
        assert!(validate_group("plans/x").is_ok());
        assert!(validate_group("../etc").is_err());
        assert!(validate_group("/abs").is_err());
        assert!(validate_group("").is_err());
    }

    #[test]
    fn keeps_date_prefix_on_rename() {
        assert_eq!(date_prefix("20240101-old-title"), "20240101-");
        assert_eq!(date_prefix("old-title"), "");
    }
}
