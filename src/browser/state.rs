//! The browser model and its modal key handling.
//!
//! [`Browser`] owns every piece of UI state. The event loop feeds it one key
//! id at a time through [`Browser::handle_key`] and every background result
//! through [`Browser::on_message`]; both return the [`Command`]s to run next.
//! Nothing here performs I/O.

use crate::browser::columns::{Column, ColumnSettings};
use crate::browser::command::{Command, Message, Mutation, MutationOutcome, PlanArchive};
use crate::browser::filter::{matches_hits, matches_query};
use crate::browser::fold::FoldState;
use crate::browser::keyseq::{KeySequence, Step};
use crate::browser::node::{DisplayNode, NodeId, NodeKind};
use crate::browser::selection::{ClipboardMode, PlanGroupKey, SelectionStore};
use crate::browser::tree::{build_tree, filter_tree, TreeBuild, TreeOptions};
use crate::core::launch::HandoffKind;
use crate::core::model::{
    archive_parent, is_archive_group, is_plan_group, Note, WorkspaceNode, DEFAULT_GROUP,
    GLOBAL_WORKSPACE, INBOX_GROUP,
};
use crate::core::sources::Placement;
use crate::tui::keys::{matches_key, text_char};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Note types offered when creating a note.
pub const NOTE_TYPES: [&str; 5] = ["note", "todo", "issue", "learn", "chat"];

const DEFAULT_VIEWPORT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatePlacement {
    /// The workspace and group under the cursor.
    Context,
    /// The inbox of the workspace under the cursor.
    Inbox,
    /// The global inbox.
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateStep {
    TypePick,
    Title,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    Browsing,
    Filtering {
        query: String,
        is_grep: bool,
    },
    ConfirmingArchive {
        notes: Vec<PathBuf>,
        plans: Vec<PlanArchive>,
    },
    ConfirmingDelete {
        notes: Vec<PathBuf>,
    },
    CreatingNote {
        placement: CreatePlacement,
        target: Placement,
        step: CreateStep,
        type_index: usize,
        title: String,
    },
    RenamingNote {
        path: PathBuf,
        title: String,
    },
    EcosystemPicker,
    ColumnPicker {
        index: usize,
    },
    HelpOverlay,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActiveFilter {
    Query(String),
    Grep {
        query: String,
        hits: HashSet<PathBuf>,
    },
}

impl ActiveFilter {
    pub fn query(&self) -> &str {
        match self {
            Self::Query(query) | Self::Grep { query, .. } => query,
        }
    }

    pub fn is_grep(&self) -> bool {
        matches!(self, Self::Grep { .. })
    }

    fn matches(&self, node: &DisplayNode) -> bool {
        match self {
            Self::Query(query) => matches_query(node, query),
            Self::Grep { hits, .. } => matches_hits(node, hits),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

/// Startup settings, normally filled from the command line.
#[derive(Clone, Debug, Default)]
pub struct BrowserConfig {
    /// Workspace name or path to focus once data has loaded.
    pub focus: Option<String>,
    pub ecosystem_picker: bool,
    pub show_archives: bool,
    pub hide_global: bool,
    pub sort_ascending: bool,
    pub table_view: bool,
    /// Write the hand-off file instead of launching an editor.
    pub handoff: bool,
    /// Quit after handing a note off.
    pub embedded: bool,
    pub columns: ColumnSettings,
    pub columns_path: PathBuf,
}

pub struct Browser {
    mode: Mode,
    workspaces: Vec<WorkspaceNode>,
    notes: Vec<Note>,
    tree: TreeBuild,
    cursor: usize,
    scroll: usize,
    viewport: usize,
    fold: FoldState,
    selection: SelectionStore,
    keys: KeySequence,
    options: TreeOptions,
    pending_focus: Option<String>,
    filter: Option<ActiveFilter>,
    pending_grep: Option<String>,
    pending_cursor: Option<NodeId>,
    columns: ColumnSettings,
    columns_path: PathBuf,
    table_view: bool,
    handoff: bool,
    embedded: bool,
    status: Option<Status>,
    generation: u64,
    loading: bool,
}

impl Browser {
    pub fn new(config: BrowserConfig) -> Self {
        let options = TreeOptions {
            focus: None,
            ecosystem_picker: config.ecosystem_picker,
            show_archives: config.show_archives,
            hide_global: config.hide_global,
            sort_ascending: config.sort_ascending,
        };
        let mode = if config.ecosystem_picker {
            Mode::EcosystemPicker
        } else {
            Mode::Browsing
        };
        let mut browser = Self {
            mode,
            workspaces: Vec::new(),
            notes: Vec::new(),
            tree: TreeBuild::default(),
            cursor: 0,
            scroll: 0,
            viewport: DEFAULT_VIEWPORT,
            fold: FoldState::new(),
            selection: SelectionStore::new(),
            keys: KeySequence::default(),
            options,
            pending_focus: config.focus,
            filter: None,
            pending_grep: None,
            pending_cursor: None,
            columns: config.columns,
            columns_path: config.columns_path,
            table_view: config.table_view,
            handoff: config.handoff,
            embedded: config.embedded,
            status: None,
            generation: 0,
            loading: false,
        };
        browser.rebuild();
        browser
    }

    /// Commands to issue before the first key arrives.
    pub fn start(&mut self) -> Vec<Command> {
        vec![self.refresh()]
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn nodes(&self) -> &[DisplayNode] {
        &self.tree.nodes
    }

    pub fn tree(&self) -> &TreeBuild {
        &self.tree
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn workspaces(&self) -> &[WorkspaceNode] {
        &self.workspaces
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn current(&self) -> Option<&DisplayNode> {
        self.tree.nodes.get(self.cursor)
    }

    pub fn fold(&self) -> &FoldState {
        &self.fold
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn filter(&self) -> Option<&ActiveFilter> {
        self.filter.as_ref()
    }

    pub fn columns(&self) -> &ColumnSettings {
        &self.columns
    }

    pub fn is_table_view(&self) -> bool {
        self.table_view
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pending_keys(&self) -> Option<&str> {
        self.keys.pending()
    }

    /// Sets the number of tree rows the screen can show.
    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        self.follow_cursor();
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    pub fn handle_key(&mut self, key: &str) -> Vec<Command> {
        if matches_key(key, "ctrl+c") {
            return vec![Command::Quit];
        }
        let mode = std::mem::replace(&mut self.mode, Mode::Browsing);
        match mode {
            Mode::Browsing => self.handle_browsing(key),
            Mode::Filtering { query, is_grep } => self.handle_filtering(key, query, is_grep),
            Mode::ConfirmingArchive { notes, plans } => {
                self.handle_confirm(key, Command::Archive { notes, plans })
            }
            Mode::ConfirmingDelete { notes } => self.handle_confirm(key, Command::Delete { notes }),
            Mode::CreatingNote {
                placement,
                target,
                step,
                type_index,
                title,
            } => self.handle_creating(key, placement, target, step, type_index, title),
            Mode::RenamingNote { path, title } => self.handle_renaming(key, path, title),
            Mode::EcosystemPicker => self.handle_picker(key),
            Mode::ColumnPicker { index } => self.handle_column_picker(key, index),
            Mode::HelpOverlay => Vec::new(),
        }
    }

    fn handle_browsing(&mut self, key: &str) -> Vec<Command> {
        match self.keys.feed(key) {
            Step::Pending => Vec::new(),
            Step::Sequence(sequence) => self.handle_sequence(&sequence),
            Step::Key(key) => self.handle_browse_key(&key),
        }
    }

    fn handle_sequence(&mut self, sequence: &str) -> Vec<Command> {
        match sequence {
            "gg" => self.set_cursor(0),
            "dd" => self.start_delete(),
            fold => self.apply_fold(fold),
        }
        Vec::new()
    }

    fn handle_browse_key(&mut self, key: &str) -> Vec<Command> {
        match key {
            "j" | "down" => self.move_cursor(1),
            "k" | "up" => self.move_cursor(-1),
            "ctrl+d" | "pagedown" => self.move_cursor(self.half_page()),
            "ctrl+u" | "pageup" => self.move_cursor(-self.half_page()),
            "G" | "end" => self.set_cursor(self.tree.len().saturating_sub(1)),
            "home" => self.set_cursor(0),
            "h" | "left" => self.fold_or_parent(),
            "l" | "right" => self.unfold_or_child(),
            "enter" => return self.activate(),
            "s" => return self.open_split(),
            "v" => return self.preview(),
            "/" => self.start_filter(false),
            "*" => self.start_filter(true),
            "space" => self.toggle_selection(),
            "a" => self.select_all_visible(),
            "N" => {
                self.selection.clear();
                self.set_status("Selection cleared");
            }
            "x" => self.capture_clipboard(ClipboardMode::Cut),
            "y" => self.capture_clipboard(ClipboardMode::Copy),
            "p" => return self.paste(),
            "X" => self.start_archive(),
            "n" => self.start_create(CreatePlacement::Context),
            "i" => self.start_create(CreatePlacement::Inbox),
            "I" => self.start_create(CreatePlacement::Global),
            "r" => self.start_rename(),
            "e" => self.enter_picker(),
            "-" => return self.clear_focus(),
            "f" => return self.focus_cursor(),
            "A" => {
                self.options.show_archives = !self.options.show_archives;
                self.set_status(if self.options.show_archives {
                    "Showing archives"
                } else {
                    "Hiding archives"
                });
                self.rebuild();
                return vec![self.refresh()];
            }
            "H" => {
                self.options.hide_global = !self.options.hide_global;
                self.rebuild();
            }
            "S" => {
                self.options.sort_ascending = !self.options.sort_ascending;
                self.set_status(if self.options.sort_ascending {
                    "Oldest first"
                } else {
                    "Newest first"
                });
                self.rebuild();
            }
            "t" => self.table_view = !self.table_view,
            "C" => self.mode = Mode::ColumnPicker { index: 0 },
            "ctrl+r" => return vec![self.refresh()],
            "?" => self.mode = Mode::HelpOverlay,
            "q" => return vec![Command::Quit],
            key if matches_key(key, "esc") => {
                self.filter = None;
                self.pending_grep = None;
                self.selection.clear();
                self.status = None;
                self.rebuild();
            }
            key => {
                if let Some(index) = key
                    .chars()
                    .next()
                    .filter(|_| key.len() == 1)
                    .and_then(|digit| self.tree.jump_keys.get(&digit).copied())
                {
                    self.set_cursor(index);
                }
            }
        }
        Vec::new()
    }

    fn handle_filtering(&mut self, key: &str, mut query: String, is_grep: bool) -> Vec<Command> {
        if matches_key(key, "esc") {
            self.filter = None;
            self.pending_grep = None;
            self.rebuild();
            return Vec::new();
        }
        if matches_key(key, "enter") {
            let trimmed = query.trim().to_string();
            if trimmed.is_empty() {
                self.filter = None;
                self.rebuild();
                return Vec::new();
            }
            if !is_grep {
                return Vec::new();
            }
            self.pending_grep = Some(trimmed.clone());
            self.set_status(format!("Searching for \"{trimmed}\"..."));
            return vec![Command::Grep {
                query: trimmed,
                workspaces: self.search_scope(),
            }];
        }
        match key {
            "up" => self.move_cursor(-1),
            "down" => self.move_cursor(1),
            "backspace" => {
                query.pop();
                if !is_grep {
                    self.apply_query(&query);
                }
            }
            _ => {
                if let Some(ch) = text_char(key) {
                    query.push(ch);
                    if !is_grep {
                        self.apply_query(&query);
                    }
                }
            }
        }
        self.mode = Mode::Filtering { query, is_grep };
        Vec::new()
    }

    fn handle_confirm(&mut self, key: &str, command: Command) -> Vec<Command> {
        match key {
            "y" | "Y" | "enter" => {
                self.set_status("Working...");
                vec![command]
            }
            "n" | "N" | "q" => {
                self.status = None;
                Vec::new()
            }
            key if matches_key(key, "esc") => {
                self.status = None;
                Vec::new()
            }
            _ => {
                self.mode = match command {
                    Command::Archive { notes, plans } => Mode::ConfirmingArchive { notes, plans },
                    Command::Delete { notes } => Mode::ConfirmingDelete { notes },
                    _ => Mode::Browsing,
                };
                Vec::new()
            }
        }
    }

    fn handle_creating(
        &mut self,
        key: &str,
        placement: CreatePlacement,
        target: Placement,
        mut step: CreateStep,
        mut type_index: usize,
        mut title: String,
    ) -> Vec<Command> {
        if matches_key(key, "esc") {
            self.status = None;
            return Vec::new();
        }
        match step {
            CreateStep::TypePick => match key {
                "j" | "down" | "tab" => type_index = (type_index + 1) % NOTE_TYPES.len(),
                "k" | "up" | "shift+tab" => {
                    type_index = (type_index + NOTE_TYPES.len() - 1) % NOTE_TYPES.len()
                }
                "enter" => step = CreateStep::Title,
                _ => {}
            },
            CreateStep::Title => match key {
                "enter" => {
                    let trimmed = title.trim();
                    if trimmed.is_empty() {
                        self.set_error("Title must not be empty");
                    } else {
                        self.set_status("Creating note...");
                        return vec![Command::Create {
                            placement: target,
                            note_type: NOTE_TYPES[type_index % NOTE_TYPES.len()].to_string(),
                            title: trimmed.to_string(),
                        }];
                    }
                }
                "backspace" => {
                    title.pop();
                }
                _ => {
                    if let Some(ch) = text_char(key) {
                        title.push(ch);
                    }
                }
            },
        }
        self.mode = Mode::CreatingNote {
            placement,
            target,
            step,
            type_index,
            title,
        };
        Vec::new()
    }

    fn handle_renaming(&mut self, key: &str, path: PathBuf, mut title: String) -> Vec<Command> {
        if matches_key(key, "esc") {
            return Vec::new();
        }
        match key {
            "enter" => {
                let trimmed = title.trim().to_string();
                if trimmed.is_empty() {
                    self.set_error("Title must not be empty");
                } else if self.note(&path).is_some_and(|note| note.title == trimmed) {
                    return Vec::new();
                } else {
                    self.set_status("Renaming...");
                    return vec![Command::Rename {
                        path,
                        title: trimmed,
                    }];
                }
            }
            "backspace" => {
                title.pop();
            }
            _ => {
                if let Some(ch) = text_char(key) {
                    title.push(ch);
                }
            }
        }
        self.mode = Mode::RenamingNote { path, title };
        Vec::new()
    }

    fn handle_picker(&mut self, key: &str) -> Vec<Command> {
        self.mode = Mode::EcosystemPicker;
        match key {
            "j" | "down" => self.move_cursor(1),
            "k" | "up" => self.move_cursor(-1),
            "g" | "home" => self.set_cursor(0),
            "G" | "end" => self.set_cursor(self.tree.len().saturating_sub(1)),
            "enter" => {
                let Some(ws) = self.current().and_then(DisplayNode::workspace).cloned() else {
                    return Vec::new();
                };
                self.leave_picker();
                return self.set_focus(Some(ws));
            }
            "q" | "e" => self.leave_picker(),
            key if matches_key(key, "esc") => self.leave_picker(),
            key => {
                if let Some(index) = key
                    .chars()
                    .next()
                    .filter(|_| key.len() == 1)
                    .and_then(|digit| self.tree.jump_keys.get(&digit).copied())
                {
                    self.set_cursor(index);
                }
            }
        }
        Vec::new()
    }

    fn handle_column_picker(&mut self, key: &str, mut index: usize) -> Vec<Command> {
        let count = Column::ALL.len();
        match key {
            "j" | "down" => index = (index + 1) % count,
            "k" | "up" => index = (index + count - 1) % count,
            "space" | "enter" => {
                self.columns.toggle(Column::ALL[index % count]);
                self.mode = Mode::ColumnPicker { index };
                return vec![Command::SaveColumns {
                    settings: self.columns.clone(),
                    path: self.columns_path.clone(),
                }];
            }
            "q" | "C" => return Vec::new(),
            key if matches_key(key, "esc") => return Vec::new(),
            _ => {}
        }
        self.mode = Mode::ColumnPicker { index };
        Vec::new()
    }

    // ---------------------------------------------------------------------
    // Messages
    // ---------------------------------------------------------------------

    pub fn on_message(&mut self, message: Message) -> Vec<Command> {
        match message {
            Message::DataLoaded {
                generation,
                workspaces,
                notes,
                errors,
            } => {
                if generation != self.generation {
                    tracing::debug!(generation, current = self.generation, "dropping stale data");
                    return Vec::new();
                }
                self.loading = false;
                self.workspaces = workspaces;
                self.notes = notes;
                if let Some(error) = errors.first() {
                    self.set_error(error.clone());
                }
                self.resolve_focus();
                self.selection.purge(&self.notes);
                self.rebuild();
                Vec::new()
            }
            Message::Mutated { mutation, outcome } => self.on_mutated(mutation, outcome),
            Message::GrepResults { query, result } => {
                if self.pending_grep.as_deref() != Some(query.as_str()) {
                    tracing::debug!(%query, "dropping grep results for an old query");
                    return Vec::new();
                }
                self.pending_grep = None;
                match result {
                    Ok(paths) => {
                        let hits: HashSet<PathBuf> = paths.into_iter().collect();
                        let known = self.notes.iter().filter(|n| hits.contains(&n.path)).count();
                        self.set_status(format!("{} for \"{query}\"", count_label(known, "match")));
                        self.filter = Some(ActiveFilter::Grep { query, hits });
                    }
                    Err(err) => self.set_error(format!("Search failed: {err}")),
                }
                self.rebuild();
                Vec::new()
            }
            Message::SplitFailed { path, error } => {
                tracing::info!("split unavailable, opening in place: {error}");
                vec![Command::OpenEditor { path }]
            }
            Message::EditorClosed { result } => {
                if let Err(err) = result {
                    self.set_error(format!("Editor failed: {err}"));
                }
                vec![self.refresh()]
            }
            Message::ColumnsSaved { result } => {
                if let Err(err) = result {
                    self.set_error(format!("Could not save columns: {err}"));
                }
                Vec::new()
            }
            Message::ExternalChange => vec![self.refresh()],
        }
    }

    fn on_mutated(&mut self, mutation: Mutation, outcome: MutationOutcome) -> Vec<Command> {
        let MutationOutcome { completed, error } = outcome;
        let verb = match mutation {
            Mutation::Archive => "Archived",
            Mutation::Delete => "Deleted",
            Mutation::Rename => "Renamed",
            Mutation::Create => "Created",
            Mutation::Paste(mode) => mode.verb(),
        };
        let mut commands = Vec::new();

        match mutation {
            Mutation::Archive | Mutation::Delete => {
                let gone: HashSet<&Path> = completed.iter().map(PathBuf::as_path).collect();
                self.notes.retain(|note| !gone.contains(note.path.as_path()));
                self.selection.clear();
                self.selection.purge(&self.notes);
            }
            Mutation::Paste(mode) => {
                // Moves run in clipboard order; keep what was not moved.
                if mode == ClipboardMode::Cut {
                    if error.is_none() {
                        self.selection.clear_clipboard();
                    } else {
                        self.selection.consume_cut(completed.len());
                    }
                }
                self.pending_cursor = completed.first().cloned().map(NodeId::Note);
            }
            Mutation::Rename => {
                self.pending_cursor = completed.first().cloned().map(NodeId::Note);
            }
            Mutation::Create => {
                if let Some(path) = completed.first() {
                    self.pending_cursor = Some(NodeId::Note(path.clone()));
                    commands.extend(self.open(path.clone()));
                }
            }
        }

        match error {
            Some(err) if completed.is_empty() => self.set_error(err),
            Some(err) => self.set_error(format!(
                "{verb} {} before failing: {err}",
                count_label(completed.len(), "note")
            )),
            None => match mutation {
                Mutation::Rename | Mutation::Create => self.set_status(format!("{verb} note")),
                _ => self.set_status(format!("{verb} {}", count_label(completed.len(), "note"))),
            },
        }

        self.rebuild();
        commands.insert(0, self.refresh());
        commands
    }

    // ---------------------------------------------------------------------
    // Tree and cursor
    // ---------------------------------------------------------------------

    fn refresh(&mut self) -> Command {
        self.generation += 1;
        self.loading = true;
        Command::LoadData {
            generation: self.generation,
            focus: self.options.focus.clone(),
            include_archived: self.options.show_archives,
        }
    }

    /// Rebuilds the display list, keeping the cursor on the same row (or its
    /// nearest surviving ancestor) when possible.
    fn rebuild(&mut self) {
        let anchors = self.cursor_anchors();
        self.tree = match self.filter.as_ref().filter(|_| !self.options.ecosystem_picker) {
            None => build_tree(&self.workspaces, &self.notes, &self.options, &self.fold),
            Some(filter) => {
                let unfolded = FoldState::new();
                let full = build_tree(&self.workspaces, &self.notes, &self.options, &unfolded);
                filter_tree(&full.nodes, |node| filter.matches(node))
            }
        };

        let pending = self.pending_cursor.take();
        let target = pending
            .iter()
            .chain(anchors.iter())
            .find_map(|id| self.tree.position(id));
        match target {
            Some(index) => self.cursor = index,
            None => {
                if let Some(id) = pending {
                    self.pending_cursor = Some(id);
                }
                self.cursor = self.cursor.min(self.tree.len().saturating_sub(1));
            }
        }
        self.follow_cursor();
    }

    fn cursor_anchors(&self) -> Vec<NodeId> {
        let mut anchors = Vec::new();
        let Some(node) = self.current() else {
            return anchors;
        };
        anchors.extend(node.id());
        let mut depth = node.depth;
        for ancestor in self.tree.nodes[..self.cursor].iter().rev() {
            if ancestor.depth < depth && !ancestor.is_separator() {
                anchors.extend(ancestor.id());
                depth = ancestor.depth;
            }
        }
        anchors
    }

    fn apply_query(&mut self, query: &str) {
        self.filter = if query.trim().is_empty() {
            None
        } else {
            Some(ActiveFilter::Query(query.to_string()))
        };
        self.rebuild();
    }

    fn set_cursor(&mut self, index: usize) {
        self.cursor = index.min(self.tree.len().saturating_sub(1));
        self.follow_cursor();
    }

    fn move_cursor(&mut self, delta: isize) {
        let target = self.cursor.saturating_add_signed(delta);
        self.set_cursor(target);
    }

    fn half_page(&self) -> isize {
        (self.viewport / 2).max(1) as isize
    }

    fn follow_cursor(&mut self) {
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + self.viewport {
            self.scroll = self.cursor + 1 - self.viewport;
        }
        let max_scroll = self.tree.len().saturating_sub(self.viewport);
        self.scroll = self.scroll.min(max_scroll);
    }

    fn parent_index(&self, index: usize) -> Option<usize> {
        let depth = self.tree.nodes.get(index)?.depth;
        self.tree.nodes[..index]
            .iter()
            .rposition(|node| node.depth < depth && !node.is_separator())
    }

    /// The row a fold key acts on: the cursor row if foldable, else its
    /// nearest foldable ancestor.
    fn fold_target(&self) -> Option<usize> {
        let mut index = self.cursor;
        loop {
            let node = self.tree.nodes.get(index)?;
            if node.is_foldable() {
                return Some(index);
            }
            index = self.parent_index(index)?;
        }
    }

    fn apply_fold(&mut self, sequence: &str) {
        match sequence {
            "zM" => self.fold.close_all(&self.tree.nodes),
            "zR" => self.fold.open_all(),
            _ => {
                let Some(index) = self.fold_target() else {
                    return;
                };
                let Some(id) = self.tree.nodes[index].id() else {
                    return;
                };
                match sequence {
                    "za" => self.fold.toggle(&id),
                    "zA" => self
                        .fold
                        .toggle_recursive(&self.tree.nodes, index, &self.workspaces),
                    "zo" => self.fold.open(&id),
                    "zO" => self
                        .fold
                        .open_recursive(&self.tree.nodes, index, &self.workspaces),
                    "zc" => self.fold.close(&id),
                    "zC" => self.fold.close_recursive(&self.tree.nodes, index),
                    _ => return,
                }
                self.cursor = index;
            }
        }
        self.rebuild();
    }

    fn fold_or_parent(&mut self) {
        let Some(node) = self.current() else {
            return;
        };
        if let Some(id) = node.id().filter(|_| node.is_foldable()) {
            if !self.fold.is_collapsed(&id) && self.has_children(self.cursor) {
                self.fold.close(&id);
                self.rebuild();
                return;
            }
        }
        if let Some(parent) = self.parent_index(self.cursor) {
            self.set_cursor(parent);
        }
    }

    fn unfold_or_child(&mut self) {
        let Some(node) = self.current() else {
            return;
        };
        let Some(id) = node.id().filter(|_| node.is_foldable()) else {
            return;
        };
        if self.fold.is_collapsed(&id) {
            self.fold.open(&id);
            self.rebuild();
        } else if self.has_children(self.cursor) {
            self.set_cursor(self.cursor + 1);
        }
    }

    fn has_children(&self, index: usize) -> bool {
        match (self.tree.nodes.get(index), self.tree.nodes.get(index + 1)) {
            (Some(node), Some(next)) => next.depth > node.depth,
            _ => false,
        }
    }

    // ---------------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------------

    fn activate(&mut self) -> Vec<Command> {
        let Some(node) = self.current() else {
            return Vec::new();
        };
        if let Some(note) = node.note() {
            let path = note.path.clone();
            return self.open(path);
        }
        if let Some(id) = node.id().filter(|_| node.is_foldable()) {
            self.fold.toggle(&id);
            self.rebuild();
        }
        Vec::new()
    }

    fn open(&mut self, path: PathBuf) -> Vec<Command> {
        if !self.handoff {
            return vec![Command::OpenEditor { path }];
        }
        let mut commands = vec![Command::Handoff {
            path,
            kind: HandoffKind::Open,
        }];
        if self.embedded {
            commands.push(Command::Quit);
        }
        commands
    }

    fn open_split(&mut self) -> Vec<Command> {
        match self.current().and_then(DisplayNode::note) {
            Some(note) => vec![Command::OpenSplit {
                path: note.path.clone(),
            }],
            None => {
                self.set_status("Move to a note to open it");
                Vec::new()
            }
        }
    }

    fn preview(&mut self) -> Vec<Command> {
        let Some(path) = self.current().and_then(DisplayNode::note).map(|n| n.path.clone()) else {
            return Vec::new();
        };
        if !self.handoff {
            self.set_status("Preview needs an embedding editor (NB_HANDOFF)");
            return Vec::new();
        }
        vec![Command::Handoff {
            path,
            kind: HandoffKind::Preview,
        }]
    }

    fn start_filter(&mut self, is_grep: bool) {
        let query = match &self.filter {
            Some(filter) if filter.is_grep() == is_grep => filter.query().to_string(),
            _ => String::new(),
        };
        self.pending_grep = None;
        self.mode = Mode::Filtering { query, is_grep };
    }

    fn toggle_selection(&mut self) {
        let Some(node) = self.current() else {
            return;
        };
        match &node.kind {
            NodeKind::Note(note) => {
                let path = note.path.clone();
                self.selection.toggle_note(&path);
            }
            NodeKind::Group {
                name, workspace, ..
            } if is_plan_group(name) && !is_archive_group(name) => {
                let key = PlanGroupKey::new(workspace.clone(), name.clone());
                self.selection.toggle_plan(key);
            }
            _ => {}
        }
    }

    fn select_all_visible(&mut self) {
        let paths: Vec<PathBuf> = self
            .tree
            .nodes
            .iter()
            .filter_map(DisplayNode::note)
            .map(|note| note.path.clone())
            .collect();
        let count = paths.len();
        self.selection.select_notes(paths);
        self.set_status(format!("Selected {}", count_label(count, "note")));
    }

    fn capture_clipboard(&mut self, mode: ClipboardMode) {
        let paths = self.targeted_notes();
        if paths.is_empty() {
            self.set_status("Nothing to copy");
            return;
        }
        let verb = match mode {
            ClipboardMode::Cut => "cut",
            ClipboardMode::Copy => "copied",
        };
        self.set_status(format!("{} {verb}", count_label(paths.len(), "note")));
        self.selection.set_clipboard(paths, mode);
        self.selection.clear();
    }

    fn paste(&mut self) -> Vec<Command> {
        let Some(clipboard) = self.selection.clipboard().cloned() else {
            self.set_status("Clipboard is empty");
            return Vec::new();
        };
        let Some(dest) = self.paste_destination() else {
            self.set_status("Move to a workspace, group or note to paste");
            return Vec::new();
        };
        self.set_status(format!(
            "Pasting {} into {}...",
            count_label(clipboard.paths.len(), "note"),
            dest.group
        ));
        vec![Command::Paste {
            paths: clipboard.paths,
            mode: clipboard.mode,
            dest,
        }]
    }

    /// Where a paste at the cursor lands: a workspace's default group, the
    /// group under the cursor, or the group of the note under the cursor.
    pub fn paste_destination(&self) -> Option<Placement> {
        let node = self.current()?;
        match &node.kind {
            NodeKind::Workspace(ws) => Some(Placement::new(
                workspace_key(&ws.name),
                DEFAULT_GROUP,
            )),
            NodeKind::Group {
                name, workspace, ..
            } => Some(Placement::new(workspace_key(workspace), name.clone())),
            NodeKind::Note(note) => Some(Placement::new(
                workspace_key(&note.workspace),
                note.group.clone(),
            )),
            NodeKind::Separator { .. } => None,
        }
    }

    fn start_archive(&mut self) {
        let (mut notes, plans) = if !self.selection.is_empty() {
            let plans: Vec<PlanArchive> = self
                .selection
                .plans()
                .into_iter()
                .map(|key| self.plan_archive(key))
                .collect();
            (self.selection.notes(), plans)
        } else {
            match self.current().map(|node| &node.kind) {
                Some(NodeKind::Note(note)) => (vec![note.path.clone()], Vec::new()),
                Some(NodeKind::Group {
                    name, workspace, ..
                }) if is_plan_group(name) && !is_archive_group(name) => {
                    let key = PlanGroupKey::new(workspace.clone(), name.clone());
                    (Vec::new(), vec![self.plan_archive(key)])
                }
                Some(NodeKind::Group {
                    name, workspace, ..
                }) => (self.notes_in_group(workspace, name), Vec::new()),
                _ => (Vec::new(), Vec::new()),
            }
        };
        let in_plans: HashSet<&PathBuf> = plans.iter().flat_map(|plan| &plan.notes).collect();
        notes.retain(|path| !in_plans.contains(path));
        if notes.is_empty() && plans.is_empty() {
            self.set_status("Nothing to archive");
            return;
        }
        self.mode = Mode::ConfirmingArchive { notes, plans };
    }

    fn start_delete(&mut self) {
        let notes = self.targeted_notes();
        if notes.is_empty() {
            self.set_status("Nothing to delete");
            return;
        }
        self.mode = Mode::ConfirmingDelete { notes };
    }

    fn start_create(&mut self, placement: CreatePlacement) {
        let target = self.create_target(placement);
        self.mode = Mode::CreatingNote {
            placement,
            target,
            step: CreateStep::TypePick,
            type_index: 0,
            title: String::new(),
        };
    }

    /// Placement a new note gets for each creation rule.
    pub fn create_target(&self, placement: CreatePlacement) -> Placement {
        let node = self.current();
        match placement {
            CreatePlacement::Global => Placement::new(None, INBOX_GROUP),
            CreatePlacement::Inbox => {
                let workspace = node.and_then(DisplayNode::owner).and_then(workspace_key);
                Placement::new(workspace, INBOX_GROUP)
            }
            CreatePlacement::Context => {
                let Some(node) = node.filter(|node| !node.is_separator()) else {
                    return Placement::new(None, INBOX_GROUP);
                };
                let workspace = node.owner().and_then(workspace_key);
                let group = node
                    .group()
                    .map(|group| archive_parent(group).unwrap_or(group))
                    .unwrap_or(DEFAULT_GROUP);
                Placement::new(workspace, group)
            }
        }
    }

    fn start_rename(&mut self) {
        match self.current().and_then(DisplayNode::note) {
            Some(note) => {
                self.mode = Mode::RenamingNote {
                    path: note.path.clone(),
                    title: note.title.clone(),
                };
            }
            None => self.set_status("Move to a note to rename it"),
        }
    }

    fn enter_picker(&mut self) {
        self.options.ecosystem_picker = true;
        self.mode = Mode::EcosystemPicker;
        self.cursor = 0;
        self.rebuild();
        if self.tree.is_empty() {
            self.set_status("No ecosystems registered");
        }
    }

    fn leave_picker(&mut self) {
        self.options.ecosystem_picker = false;
        self.mode = Mode::Browsing;
        self.rebuild();
    }

    fn clear_focus(&mut self) -> Vec<Command> {
        if self.options.focus.is_none() {
            return Vec::new();
        }
        self.set_focus(None)
    }

    fn focus_cursor(&mut self) -> Vec<Command> {
        let Some(node) = self.current() else {
            return Vec::new();
        };
        let target = match &node.kind {
            NodeKind::Workspace(ws) => Some(ws.clone()),
            _ => node.owner().and_then(|name| self.workspace_named(name)),
        };
        match target {
            Some(ws) => self.set_focus(Some(ws)),
            None => Vec::new(),
        }
    }

    fn set_focus(&mut self, focus: Option<WorkspaceNode>) -> Vec<Command> {
        match &focus {
            Some(ws) => self.set_status(format!("Focused on {}", ws.name)),
            None => self.set_status("Showing all workspaces"),
        }
        self.options.focus = focus;
        self.filter = None;
        self.cursor = 0;
        self.rebuild();
        vec![self.refresh()]
    }

    fn resolve_focus(&mut self) {
        if let Some(wanted) = self.pending_focus.take() {
            match self.workspace_named(&wanted).or_else(|| {
                self.workspaces
                    .iter()
                    .find(|ws| ws.path == Path::new(&wanted))
                    .cloned()
            }) {
                Some(ws) => self.options.focus = Some(ws),
                None => self.set_error(format!("Unknown workspace: {wanted}")),
            }
            return;
        }
        // Registry entries may have changed depth or kind since focusing.
        if let Some(focus) = &self.options.focus {
            if let Some(fresh) = self.workspaces.iter().find(|ws| ws.path == focus.path) {
                self.options.focus = Some(fresh.clone());
            }
        }
    }

    fn workspace_named(&self, name: &str) -> Option<WorkspaceNode> {
        if name == GLOBAL_WORKSPACE {
            return Some(WorkspaceNode::global());
        }
        self.workspaces.iter().find(|ws| ws.name == name).cloned()
    }

    /// Workspaces a content search covers.
    fn search_scope(&self) -> Vec<WorkspaceNode> {
        let mut scope = Vec::new();
        if !self.options.hide_global {
            scope.push(WorkspaceNode::global());
        }
        scope.extend(
            self.workspaces
                .iter()
                .filter(|ws| match &self.options.focus {
                    Some(focus) => ws.path == focus.path || ws.is_descendant_of(focus),
                    None => true,
                })
                .cloned(),
        );
        scope
    }

    /// The selection if any, else the note or group under the cursor.
    fn targeted_notes(&self) -> Vec<PathBuf> {
        if !self.selection.is_empty() {
            let mut paths = self.selection.notes();
            for key in self.selection.plans() {
                for path in self.notes_in_group(&key.workspace, &key.group) {
                    if !paths.contains(&path) {
                        paths.push(path);
                    }
                }
            }
            return paths;
        }
        match self.current().map(|node| &node.kind) {
            Some(NodeKind::Note(note)) => vec![note.path.clone()],
            Some(NodeKind::Group {
                name, workspace, ..
            }) => self.notes_in_group(workspace, name),
            _ => Vec::new(),
        }
    }

    fn notes_in_group(&self, workspace: &str, group: &str) -> Vec<PathBuf> {
        let nested = format!("{group}/");
        let include_archives = is_archive_group(group);
        self.notes
            .iter()
            .filter(|note| note.workspace == workspace)
            .filter(|note| note.group == group || note.group.starts_with(&nested))
            .filter(|note| include_archives || !is_archive_group(&note.group))
            .map(|note| note.path.clone())
            .collect()
    }

    fn plan_archive(&self, key: PlanGroupKey) -> PlanArchive {
        let notes = self.notes_in_group(&key.workspace, &key.group);
        PlanArchive { key, notes }
    }

    fn note(&self, path: &Path) -> Option<&Note> {
        self.notes.iter().find(|note| note.path == path)
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: false,
        });
    }

    /// Shows `text` as an error in the status line.
    pub fn set_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!("{text}");
        self.status = Some(Status {
            text,
            is_error: true,
        });
    }
}

fn workspace_key(name: &str) -> Option<String> {
    (name != GLOBAL_WORKSPACE).then(|| name.to_string())
}

fn count_label(count: usize, noun: &str) -> String {
    match (count, noun) {
        (1, _) => format!("1 {noun}"),
        (_, "match") => format!("{count} matches"),
        _ => format!("{count} {noun}s"),
    }
}
