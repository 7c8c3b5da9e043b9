//! Display tree construction.
//!
//! [`build_tree`] turns the workspace forest and the flat note list into the
//! ordered rows the browser shows. It is a pure function of its inputs: the
//! same workspaces, notes, options and fold state always produce the same
//! rows.
//!
//! Layout of one workspace:
//!
//! ```text
//! repo-a
//! ├─ current
//! │  ├─ note
//! │  └─ .archive        (only with show_archives)
//! ├─ plans
//! │  └─ x
//! │     └─ note
//! │                     (separator, when child workspaces follow)
//! └─ sub-project
//! ```

use crate::browser::fold::FoldState;
use crate::browser::node::{DisplayNode, NodeId, NodeKind};
use crate::core::model::{
    archive_parent, is_archive_group, is_plan_group, Note, WorkspaceKind, WorkspaceNode,
    PLANS_GROUP,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

pub const UNGROUPED_LABEL: &str = "Ungrouped";
const MAX_JUMP_KEYS: u32 = 9;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeOptions {
    pub focus: Option<WorkspaceNode>,
    pub ecosystem_picker: bool,
    pub show_archives: bool,
    pub hide_global: bool,
    pub sort_ascending: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeBuild {
    pub nodes: Vec<DisplayNode>,
    pub jump_keys: HashMap<char, usize>,
}

impl TreeBuild {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.id().as_ref() == Some(id))
    }
}

pub fn build_tree(
    workspaces: &[WorkspaceNode],
    notes: &[Note],
    options: &TreeOptions,
    fold: &FoldState,
) -> TreeBuild {
    let mut nodes = if options.ecosystem_picker {
        picker_rows(workspaces)
    } else {
        let index = NoteIndex::new(notes, options);
        let emitter = Emitter {
            index: &index,
            fold,
            show_archives: options.show_archives,
            prune_empty: options.focus.is_none(),
            focus_path: options.focus.as_ref().map(|ws| ws.path.clone()),
            claimed: RefCell::new(HashSet::new()),
        };
        match &options.focus {
            Some(focus) => emitter.focused(workspaces, focus, options.hide_global),
            None => emitter.global_view(workspaces, options.hide_global),
        }
    };
    assign_prefixes(&mut nodes);
    let jump_keys = assign_jump_keys(&mut nodes);
    TreeBuild { nodes, jump_keys }
}

/// Keeps every row `matches` accepts plus all of its ancestors. Separators
/// are dropped; prefixes and jump keys are recomputed.
pub fn filter_tree<F>(nodes: &[DisplayNode], matches: F) -> TreeBuild
where
    F: Fn(&DisplayNode) -> bool,
{
    let mut keep = vec![false; nodes.len()];
    let mut ancestors: Vec<usize> = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        if node.is_separator() {
            continue;
        }
        while ancestors
            .last()
            .is_some_and(|&top| nodes[top].depth >= node.depth)
        {
            ancestors.pop();
        }
        if matches(node) {
            keep[index] = true;
            for &ancestor in &ancestors {
                keep[ancestor] = true;
            }
        }
        ancestors.push(index);
    }

    let mut kept: Vec<DisplayNode> = nodes
        .iter()
        .zip(keep)
        .filter(|(_, keep)| *keep)
        .map(|(node, _)| node.clone())
        .collect();
    assign_prefixes(&mut kept);
    let jump_keys = assign_jump_keys(&mut kept);
    TreeBuild {
        nodes: kept,
        jump_keys,
    }
}

/// Derives the `├─ `/`└─ `/`│  ` prefix of every row from row depths.
pub fn assign_prefixes(nodes: &mut [DisplayNode]) {
    // Reverse pass: a row is last when no later sibling follows before the
    // parent's subtree ends.
    let mut is_last = vec![false; nodes.len()];
    let mut sibling_below: Vec<bool> = Vec::new();
    for index in (0..nodes.len()).rev() {
        let node = &nodes[index];
        if node.is_separator() {
            continue;
        }
        let depth = node.depth;
        if sibling_below.len() <= depth {
            sibling_below.resize(depth + 1, false);
        }
        is_last[index] = !sibling_below[depth];
        sibling_below[depth] = true;
        sibling_below.truncate(depth + 1);
    }

    let mut last_at: Vec<bool> = Vec::new();
    for (index, node) in nodes.iter_mut().enumerate() {
        let depth = node.depth;
        let mut prefix = String::new();
        for level in 1..depth {
            let closed = last_at.get(level).copied().unwrap_or(false);
            prefix.push_str(if closed { "   " } else { "│  " });
        }
        if node.is_separator() {
            if depth > 0 {
                prefix.push('│');
            }
            node.prefix = prefix;
            continue;
        }
        if depth > 0 {
            prefix.push_str(if is_last[index] { "└─ " } else { "├─ " });
        }
        node.prefix = prefix;
        last_at.truncate(depth);
        last_at.resize(depth, false);
        last_at.push(is_last[index]);
    }
}

fn assign_jump_keys(nodes: &mut [DisplayNode]) -> HashMap<char, usize> {
    let mut keys = HashMap::new();
    let mut next = 1;
    for (index, node) in nodes.iter_mut().enumerate() {
        node.jump_key = None;
        if next > MAX_JUMP_KEYS || node.depth > 1 || node.workspace().is_none() {
            continue;
        }
        if let Some(key) = char::from_digit(next, 10) {
            node.jump_key = Some(key);
            keys.insert(key, index);
            next += 1;
        }
    }
    keys
}

/// Top-level ecosystem roots plus every ecosystem worktree. Worktrees carry
/// the depth of their parent ecosystem, so they are not filtered on depth.
fn picker_rows(workspaces: &[WorkspaceNode]) -> Vec<DisplayNode> {
    workspaces
        .iter()
        .filter(|ws| {
            (ws.depth == 0 && ws.kind == WorkspaceKind::EcosystemRoot)
                || ws.kind == WorkspaceKind::EcosystemWorktree
        })
        .map(|ws| DisplayNode::new(NodeKind::Workspace(ws.clone()), 0))
        .collect()
}

type GroupMap<'a> = BTreeMap<&'a str, Vec<&'a Note>>;

/// Notes partitioned by workspace and group, each group sorted by creation
/// time.
struct NoteIndex<'a> {
    by_workspace: HashMap<&'a str, GroupMap<'a>>,
}

impl<'a> NoteIndex<'a> {
    fn new(notes: &'a [Note], options: &TreeOptions) -> Self {
        let mut by_workspace: HashMap<&str, GroupMap> = HashMap::new();
        for note in notes {
            if is_archive_group(&note.group) && !options.show_archives {
                continue;
            }
            by_workspace
                .entry(note.workspace.as_str())
                .or_default()
                .entry(note.group.as_str())
                .or_default()
                .push(note);
        }
        for groups in by_workspace.values_mut() {
            for group in groups.values_mut() {
                if options.sort_ascending {
                    group.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                } else {
                    group.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                }
            }
        }
        Self { by_workspace }
    }

    fn groups(&self, workspace: &str) -> Option<&GroupMap<'a>> {
        self.by_workspace.get(workspace)
    }
}

struct Emitter<'a> {
    index: &'a NoteIndex<'a>,
    fold: &'a FoldState,
    show_archives: bool,
    prune_empty: bool,
    focus_path: Option<PathBuf>,
    /// Workspace names whose notes are already attached to an emitted row.
    /// Notes are stored by workspace name, so a second workspace with the
    /// same name gets none and every group and note id stays unique.
    claimed: RefCell<HashSet<String>>,
}

impl Emitter<'_> {
    fn global_view(&self, workspaces: &[WorkspaceNode], hide_global: bool) -> Vec<DisplayNode> {
        let mut grouped = Vec::new();
        if !hide_global {
            grouped.push(WorkspaceNode::global());
        }
        let mut ungrouped = Vec::new();
        let mut in_ecosystem = true;
        for ws in workspaces {
            if ws.depth == 0 {
                in_ecosystem = ws.kind.is_ecosystem();
            }
            if in_ecosystem {
                grouped.push(ws.clone());
            } else {
                ungrouped.push(ws.clone());
            }
        }

        let mut out = Vec::new();
        self.emit_section(&grouped, &mut out);
        let mut rest = Vec::new();
        self.emit_section(&ungrouped, &mut rest);
        if !out.is_empty() && !rest.is_empty() {
            out.push(DisplayNode::new(
                NodeKind::Separator {
                    label: Some(UNGROUPED_LABEL.to_string()),
                },
                0,
            ));
        }
        out.extend(rest);
        out
    }

    fn focused(
        &self,
        workspaces: &[WorkspaceNode],
        focus: &WorkspaceNode,
        hide_global: bool,
    ) -> Vec<DisplayNode> {
        let mut section = Vec::new();
        if !hide_global && !focus.is_global() {
            section.push(WorkspaceNode::global());
        }
        let base = focus.depth;
        let mut root = focus.clone();
        root.depth = 0;
        section.push(root);
        for ws in workspaces.iter().filter(|ws| ws.is_descendant_of(focus)) {
            let mut ws = ws.clone();
            ws.depth = ws.depth.saturating_sub(base).max(1);
            section.push(ws);
        }

        let mut out = Vec::new();
        self.emit_section(&section, &mut out);
        out
    }

    fn emit_section(&self, section: &[WorkspaceNode], out: &mut Vec<DisplayNode>) {
        let Some(top) = section.iter().map(|ws| ws.depth).min() else {
            return;
        };
        for (index, ws) in section.iter().enumerate() {
            if ws.depth == top {
                self.emit_workspace(section, index, out);
            }
        }
    }

    fn emit_workspace(&self, section: &[WorkspaceNode], index: usize, out: &mut Vec<DisplayNode>) {
        let ws = &section[index];
        let is_focus = self.focus_path.as_ref() == Some(&ws.path);
        if ws.kind.is_worktree() && !is_focus {
            return;
        }
        let groups = if self.claim(&ws.name) {
            self.index.groups(&ws.name)
        } else {
            tracing::debug!(
                workspace = %ws.name,
                path = %ws.path.display(),
                "duplicate workspace name"
            );
            None
        };
        if self.prune_empty && ws.depth > 0 && !ws.kind.is_ecosystem() && groups.is_none() {
            return;
        }

        out.push(DisplayNode::new(NodeKind::Workspace(ws.clone()), ws.depth));
        if self.fold.is_collapsed(&NodeId::Workspace(ws.path.clone())) {
            return;
        }

        let mut group_rows = Vec::new();
        if let Some(groups) = groups {
            self.emit_groups(&ws.name, groups, ws.depth + 1, &mut group_rows);
        }
        let mut child_rows = Vec::new();
        for child in children(section, index) {
            self.emit_workspace(section, child, &mut child_rows);
        }

        let separate = !group_rows.is_empty() && !child_rows.is_empty();
        out.extend(group_rows);
        if separate {
            out.push(DisplayNode::new(
                NodeKind::Separator { label: None },
                ws.depth + 1,
            ));
        }
        out.extend(child_rows);
    }

    fn emit_groups(
        &self,
        workspace: &str,
        groups: &GroupMap,
        depth: usize,
        out: &mut Vec<DisplayNode>,
    ) {
        let mut regular: BTreeSet<&str> = BTreeSet::new();
        let mut plans: BTreeSet<&str> = BTreeSet::new();
        let mut archives: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for &group in groups.keys() {
            if is_archive_group(group) {
                match archive_parent(group) {
                    Some(parent) => {
                        if is_plan_group(parent) {
                            plans.insert(parent);
                        } else if parent != PLANS_GROUP {
                            regular.insert(parent);
                        }
                        archives.entry(parent).or_default().push(group);
                    }
                    None => {
                        regular.insert(group);
                    }
                }
            } else if is_plan_group(group) {
                plans.insert(group);
            } else if group != PLANS_GROUP {
                regular.insert(group);
            }
        }

        for group in &regular {
            self.emit_group(workspace, group, groups, &archives, depth, out);
        }

        let plan_root_notes = groups.get(PLANS_GROUP);
        if plans.is_empty() && plan_root_notes.is_none() && !archives.contains_key(PLANS_GROUP) {
            return;
        }
        out.push(DisplayNode::new(
            NodeKind::Group {
                name: PLANS_GROUP.to_string(),
                workspace: workspace.to_string(),
                child_count: plans.len(),
            },
            depth,
        ));
        if self.is_group_collapsed(workspace, PLANS_GROUP) {
            return;
        }
        for note in plan_root_notes.into_iter().flatten() {
            out.push(DisplayNode::new(NodeKind::Note((*note).clone()), depth + 1));
        }
        for plan in &plans {
            self.emit_group(workspace, plan, groups, &archives, depth + 1, out);
        }
        for archive in archives.get(PLANS_GROUP).into_iter().flatten() {
            self.emit_group(workspace, archive, groups, &BTreeMap::new(), depth + 1, out);
        }
    }

    fn emit_group(
        &self,
        workspace: &str,
        name: &str,
        groups: &GroupMap,
        archives: &BTreeMap<&str, Vec<&str>>,
        depth: usize,
        out: &mut Vec<DisplayNode>,
    ) {
        let notes = groups.get(name).map(Vec::as_slice).unwrap_or(&[]);
        out.push(DisplayNode::new(
            NodeKind::Group {
                name: name.to_string(),
                workspace: workspace.to_string(),
                child_count: notes.len(),
            },
            depth,
        ));
        if self.is_group_collapsed(workspace, name) {
            return;
        }
        for note in notes {
            out.push(DisplayNode::new(NodeKind::Note((*note).clone()), depth + 1));
        }
        if self.show_archives {
            for archive in archives.get(name).into_iter().flatten() {
                self.emit_group(workspace, archive, groups, &BTreeMap::new(), depth + 1, out);
            }
        }
    }

    fn claim(&self, name: &str) -> bool {
        self.claimed.borrow_mut().insert(name.to_string())
    }

    fn is_group_collapsed(&self, workspace: &str, name: &str) -> bool {
        self.fold.is_collapsed(&NodeId::Group {
            workspace: workspace.to_string(),
            name: name.to_string(),
        })
    }
}

/// Direct children of `section[index]` in a pre-ordered, depth-annotated list.
fn children(section: &[WorkspaceNode], index: usize) -> Vec<usize> {
    let depth = section[index].depth;
    section[index + 1..]
        .iter()
        .enumerate()
        .take_while(|(_, ws)| ws.depth > depth)
        .filter(|(_, ws)| ws.depth == depth + 1)
        .map(|(offset, _)| index + 1 + offset)
        .collect()
}
