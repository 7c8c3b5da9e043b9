//! Draws a [`Browser`] into screen lines. Pure: the event loop writes the
//! returned lines to the terminal.

use crate::browser::columns::Column;
use crate::browser::filter::match_span;
use crate::browser::node::{DisplayNode, NodeKind};
use crate::browser::selection::PlanGroupKey;
use crate::browser::state::{ActiveFilter, Browser, CreateStep, Mode, NOTE_TYPES};
use crate::core::model::{is_archive_group, WorkspaceKind, GLOBAL_WORKSPACE};
use crate::core::sources::Placement;
use crate::tui::theme::BrowserTheme;
use crate::tui::utils::{apply_background_to_line, fit_to_width, truncate_to_width, visible_width};

const HEADER_ROWS: usize = 1;
const FOOTER_ROWS: usize = 2;
const COLUMN_GAP: &str = "  ";
const MIN_NAME_WIDTH: usize = 12;

const HELP: &[(&str, &str)] = &[
    ("j/k, up/down", "move"),
    ("ctrl+d/ctrl+u", "half page down/up"),
    ("gg, G", "top, bottom"),
    ("1-9", "jump to workspace"),
    ("h/l", "close fold or parent, open fold"),
    ("za zA zo zO zc zC", "toggle, open, close folds (capital: recursive)"),
    ("zM, zR", "close all, open all"),
    ("enter", "open note, toggle fold"),
    ("s", "open in a tmux split"),
    ("v", "preview in the embedding editor"),
    ("/, *", "filter titles, search contents"),
    ("space, a, N", "select, select all, select none"),
    ("x, y, p", "cut, copy, paste"),
    ("X, dd", "archive, delete"),
    ("n, i, I", "new note here, in inbox, in global inbox"),
    ("r", "rename"),
    ("e, f, -", "pick ecosystem, focus, clear focus"),
    ("A, H, S", "archives, hide global, sort order"),
    ("t, C", "table view, columns"),
    ("ctrl+r", "refresh"),
    ("esc", "clear filter and selection"),
    ("q", "quit"),
];

/// Number of tree rows that fit below the header and above the footer.
pub fn viewport_rows(browser: &Browser, height: usize) -> usize {
    let table_header = usize::from(browser.is_table_view());
    height
        .saturating_sub(HEADER_ROWS + FOOTER_ROWS + table_header)
        .max(1)
}

pub fn render(browser: &Browser, width: usize, height: usize) -> Vec<String> {
    render_with_theme(browser, width, height, &BrowserTheme::default())
}

pub fn render_with_theme(
    browser: &Browser,
    width: usize,
    height: usize,
    theme: &BrowserTheme,
) -> Vec<String> {
    let width = width.max(1);
    let body_height = height.saturating_sub(HEADER_ROWS + FOOTER_ROWS);

    let mut lines = vec![render_header(browser, width, theme)];
    let mut body = match browser.mode() {
        Mode::HelpOverlay => render_help(width, theme),
        Mode::ColumnPicker { index } => render_column_picker(browser, *index, theme),
        _ if browser.is_table_view() => render_table(browser, width, theme),
        _ => render_tree(browser, width, theme),
    };
    body.truncate(body_height);
    while body.len() < body_height {
        body.push(String::new());
    }
    lines.extend(body);
    lines.push(render_prompt(browser, theme));
    lines.push(render_hints(browser, theme));

    lines.truncate(height.max(1));
    lines
        .iter()
        .map(|line| truncate_to_width(line, width))
        .collect()
}

fn render_header(browser: &Browser, width: usize, theme: &BrowserTheme) -> String {
    let options = browser.options();
    let mut parts = vec!["nb".to_string()];
    match &options.focus {
        Some(ws) => parts.push(format!("focus: {}", ws.name)),
        None if options.ecosystem_picker => parts.push("ecosystems".to_string()),
        None => parts.push("all workspaces".to_string()),
    }
    if options.show_archives {
        parts.push("archives".to_string());
    }
    if options.hide_global {
        parts.push("no global".to_string());
    }
    parts.push(if options.sort_ascending { "oldest first" } else { "newest first" }.to_string());
    if browser.is_loading() {
        parts.push("loading...".to_string());
    }
    let header = truncate_to_width(&parts.join(" · "), width);
    (theme.header)(&header)
}

// -------------------------------------------------------------------------
// Tree
// -------------------------------------------------------------------------

fn visible_range(browser: &Browser) -> std::ops::Range<usize> {
    let start = browser.scroll().min(browser.nodes().len());
    let end = (start + browser.viewport()).min(browser.nodes().len());
    start..end
}

fn render_tree(browser: &Browser, width: usize, theme: &BrowserTheme) -> Vec<String> {
    if browser.nodes().is_empty() {
        return vec![render_empty(browser, theme)];
    }
    visible_range(browser)
        .map(|index| {
            let node = &browser.nodes()[index];
            let line = render_row(browser, node, theme);
            finish_row(browser, index, &line, width, theme)
        })
        .collect()
}

fn render_empty(browser: &Browser, theme: &BrowserTheme) -> String {
    let text = if browser.is_loading() {
        "  Loading..."
    } else if browser.filter().is_some() {
        "  No matches"
    } else if browser.options().ecosystem_picker {
        "  No ecosystems registered"
    } else {
        "  No notes"
    };
    (theme.dim)(text)
}

fn finish_row(
    browser: &Browser,
    index: usize,
    line: &str,
    width: usize,
    theme: &BrowserTheme,
) -> String {
    let line = truncate_to_width(line, width);
    if index == browser.cursor() {
        apply_background_to_line(&line, width, theme.cursor_bg)
    } else {
        line
    }
}

fn render_row(browser: &Browser, node: &DisplayNode, theme: &BrowserTheme) -> String {
    let prefix = (theme.prefix)(&node.prefix);
    match &node.kind {
        NodeKind::Separator { label } => match label {
            Some(label) => {
                let rule = format!("── {label} ──");
                format!("{prefix}{}", (theme.separator)(&rule))
            }
            None => prefix,
        },
        NodeKind::Workspace(ws) => {
            let jump = node
                .jump_key
                .map(|key| (theme.jump_key)(&format!("{key} ")))
                .unwrap_or_default();
            let style = if ws.kind.is_ecosystem() {
                theme.ecosystem
            } else {
                theme.workspace
            };
            let kind = if ws.kind == WorkspaceKind::Standalone || ws.name == GLOBAL_WORKSPACE {
                String::new()
            } else {
                (theme.dim)(&format!(" {}", ws.kind.label()))
            };
            format!(
                "{prefix}{}{jump}{}{kind}",
                fold_marker(browser, node),
                style(&ws.name)
            )
        }
        NodeKind::Group {
            name,
            workspace,
            child_count,
        } => {
            let key = PlanGroupKey::new(workspace.clone(), name.clone());
            let marker = if browser.selection().is_plan_selected(&key) {
                (theme.selected)("● ")
            } else {
                String::new()
            };
            let style = if is_archive_group(name) {
                theme.archived
            } else {
                theme.group
            };
            let label = highlight(&node.label(), query_of(browser), style, theme);
            format!(
                "{prefix}{}{marker}{label}{}",
                fold_marker(browser, node),
                (theme.count)(&format!(" ({child_count})"))
            )
        }
        NodeKind::Note(note) => {
            let marker = if browser.selection().is_selected(&note.path) {
                (theme.selected)("● ")
            } else {
                String::new()
            };
            let style = if note.is_archived {
                theme.archived
            } else {
                theme.note
            };
            let mut title = highlight(&note.title, query_of(browser), style, theme);
            if browser.selection().is_cut(&note.path) {
                title = (theme.cut)(&title);
            }
            let kind = if note.note_type == NOTE_TYPES[0] {
                String::new()
            } else {
                (theme.dim)(&format!(" [{}]", note.note_type))
            };
            format!("{prefix}{marker}{title}{kind}")
        }
    }
}

fn fold_marker(browser: &Browser, node: &DisplayNode) -> &'static str {
    match node.id() {
        Some(id) if browser.fold().is_collapsed(&id) => "▸ ",
        _ => "",
    }
}

fn query_of(browser: &Browser) -> Option<&str> {
    match browser.mode() {
        Mode::Filtering {
            query,
            is_grep: false,
        } => Some(query.as_str()),
        _ => match browser.filter() {
            Some(ActiveFilter::Query(query)) => Some(query.as_str()),
            _ => None,
        },
    }
}

/// Styles `text` with `style`, underlining the first match of `query`.
fn highlight(
    text: &str,
    query: Option<&str>,
    style: fn(&str) -> String,
    theme: &BrowserTheme,
) -> String {
    match query.and_then(|query| match_span(text, query)) {
        Some(span) => format!(
            "{}{}{}",
            style(&text[..span.start]),
            (theme.matched)(&text[span.clone()]),
            style(&text[span.end..])
        ),
        None => style(text),
    }
}

// -------------------------------------------------------------------------
// Table
// -------------------------------------------------------------------------

/// Widths span every row of the tree so columns hold still while scrolling.
fn column_widths(browser: &Browser, columns: &[Column]) -> Vec<usize> {
    let notes: Vec<_> = browser.nodes().iter().filter_map(DisplayNode::note).collect();
    columns
        .iter()
        .map(|column| {
            let (min, max) = column.width_bounds();
            let longest = notes
                .iter()
                .map(|note| visible_width(&column.cell(note)))
                .chain(std::iter::once(column.header().len()))
                .max()
                .unwrap_or(0);
            longest.clamp(min, max)
        })
        .collect()
}

fn render_table(browser: &Browser, width: usize, theme: &BrowserTheme) -> Vec<String> {
    let columns = browser.columns().visible_columns();
    let widths = column_widths(browser, &columns);
    let fixed: usize = widths.iter().map(|w| w + COLUMN_GAP.len()).sum();
    let name_width = width.saturating_sub(fixed).max(MIN_NAME_WIDTH);

    let mut header = fit_to_width("NAME", name_width);
    for (column, width) in columns.iter().zip(&widths) {
        header.push_str(COLUMN_GAP);
        header.push_str(&fit_to_width(column.header(), *width));
    }
    let mut lines = vec![(theme.header)(&header)];

    if browser.nodes().is_empty() {
        lines.push(render_empty(browser, theme));
        return lines;
    }
    for index in visible_range(browser) {
        let node = &browser.nodes()[index];
        let mut line = fit_to_width(&render_row(browser, node, theme), name_width);
        if let Some(note) = node.note() {
            for (column, width) in columns.iter().zip(&widths) {
                line.push_str(COLUMN_GAP);
                line.push_str(&(theme.dim)(&fit_to_width(&column.cell(note), *width)));
            }
        }
        lines.push(finish_row(browser, index, &line, width, theme));
    }
    lines
}

// -------------------------------------------------------------------------
// Overlays and footer
// -------------------------------------------------------------------------

fn render_help(width: usize, theme: &BrowserTheme) -> Vec<String> {
    let key_width = HELP.iter().map(|(key, _)| key.len()).max().unwrap_or(0) + 2;
    let mut lines = vec![(theme.header)("Keys"), String::new()];
    lines.extend(HELP.iter().map(|(key, action)| {
        let line = format!(
            "  {}{}",
            (theme.jump_key)(&fit_to_width(key, key_width)),
            action
        );
        truncate_to_width(&line, width)
    }));
    lines.push(String::new());
    lines.push((theme.dim)("  press any key to close"));
    lines
}

fn render_column_picker(browser: &Browser, index: usize, theme: &BrowserTheme) -> Vec<String> {
    let mut lines = vec![(theme.header)("Table columns"), String::new()];
    for (position, column) in Column::ALL.iter().enumerate() {
        let check = if browser.columns().is_visible(*column) {
            "[x]"
        } else {
            "[ ]"
        };
        let line = format!("  {check} {}", column.name());
        lines.push(if position == index {
            (theme.prompt)(&line)
        } else {
            line
        });
    }
    lines
}

fn placement_label(placement: &Placement) -> String {
    let workspace = placement.workspace.as_deref().unwrap_or(GLOBAL_WORKSPACE);
    format!("{workspace}/{}", placement.group)
}

fn render_prompt(browser: &Browser, theme: &BrowserTheme) -> String {
    match browser.mode() {
        Mode::Filtering { query, is_grep } => {
            let sigil = if *is_grep { "*" } else { "/" };
            format!("{}{query}█", (theme.prompt)(sigil))
        }
        Mode::ConfirmingArchive { notes, plans } => {
            let mut what = Vec::new();
            if !notes.is_empty() {
                what.push(count_label(notes.len(), "note"));
            }
            if !plans.is_empty() {
                what.push(count_label(plans.len(), "plan"));
            }
            (theme.prompt)(&format!("Archive {}? [y/n]", what.join(" and ")))
        }
        Mode::ConfirmingDelete { notes } => (theme.prompt)(&format!(
            "Delete {}? This cannot be undone. [y/n]",
            count_label(notes.len(), "note")
        )),
        Mode::CreatingNote {
            target,
            step,
            type_index,
            title,
            ..
        } => {
            let dest = placement_label(target);
            match step {
                CreateStep::TypePick => {
                    let types: Vec<String> = NOTE_TYPES
                        .iter()
                        .enumerate()
                        .map(|(index, kind)| {
                            if index == *type_index {
                                (theme.prompt)(&format!("[{kind}]"))
                            } else {
                                format!(" {kind} ")
                            }
                        })
                        .collect();
                    format!("New note in {dest}: {}", types.join(""))
                }
                CreateStep::Title => format!(
                    "{} {title}█",
                    (theme.prompt)(&format!("New {} in {dest}:", NOTE_TYPES[*type_index]))
                ),
            }
        }
        Mode::RenamingNote { title, .. } => format!("{} {title}█", (theme.prompt)("Rename:")),
        Mode::EcosystemPicker => (theme.prompt)("Pick an ecosystem: enter focuses, esc cancels"),
        Mode::ColumnPicker { .. } => (theme.prompt)("Columns: space toggles, esc closes"),
        Mode::HelpOverlay => String::new(),
        Mode::Browsing => render_status(browser, theme),
    }
}

fn render_status(browser: &Browser, theme: &BrowserTheme) -> String {
    if let Some(pending) = browser.pending_keys() {
        return (theme.dim)(&format!("{pending}-"));
    }
    if let Some(status) = browser.status() {
        let style = if status.is_error {
            theme.error
        } else {
            theme.status
        };
        return style(&status.text);
    }
    match browser.filter() {
        Some(ActiveFilter::Query(query)) => (theme.dim)(&format!("filter: {query} (esc clears)")),
        Some(ActiveFilter::Grep { query, .. }) => {
            (theme.dim)(&format!("content: {query} (esc clears)"))
        }
        None => String::new(),
    }
}

fn render_hints(browser: &Browser, theme: &BrowserTheme) -> String {
    let mut parts = vec![count_label(browser.notes().len(), "note")];
    let selected = browser.selection().len();
    if selected > 0 {
        parts.push(format!("{selected} selected"));
    }
    if let Some(clipboard) = browser.selection().clipboard() {
        parts.push(format!(
            "{} on clipboard",
            count_label(clipboard.paths.len(), "note")
        ));
    }
    parts.push("? help".to_string());
    (theme.dim)(&parts.join(" · "))
}

fn count_label(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::command::Message;
    use crate::browser::state::BrowserConfig;
    use crate::core::model::{Note, WorkspaceNode};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn plain(text: &str) -> String {
        text.to_string()
    }

    fn tagged(title: &str, tags: &[&str], day: u32) -> Note {
        let created = Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap();
        Note {
            path: PathBuf::from(format!("/nb/repo-a/current/{title}.md")),
            title: title.to_string(),
            note_type: "note".to_string(),
            group: "current".to_string(),
            workspace: "repo-a".to_string(),
            branch: None,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            created_at: created,
            modified_at: created,
            has_todos: false,
            is_archived: false,
            is_artifact: false,
            plan_ref: None,
        }
    }

    #[test]
    fn column_widths_cover_rows_outside_the_viewport() {
        let mut browser = Browser::new(BrowserConfig {
            hide_global: true,
            table_view: true,
            ..BrowserConfig::default()
        });
        browser.start();
        let generation = browser.generation();
        browser.on_message(Message::DataLoaded {
            generation,
            workspaces: vec![WorkspaceNode::new(
                "repo-a",
                "/src/repo-a",
                WorkspaceKind::Standalone,
            )],
            notes: vec![
                tagged("old", &["alpha", "beta", "gamma"], 1),
                tagged("new", &[], 2),
            ],
            errors: Vec::new(),
        });
        // Rows: repo-a, current, new, old. Only the first two are on screen.
        browser.set_viewport(2);

        let widths = column_widths(&browser, &[Column::Tags]);
        assert_eq!(widths, vec!["alpha, beta, gamma".len()]);
    }

    #[test]
    fn highlight_wraps_only_the_match() {
        let mut theme = BrowserTheme::default();
        theme.matched = |s| format!("<{s}>");
        assert_eq!(
            highlight("Deploy Plan", Some("plan"), plain, &theme),
            "Deploy <Plan>"
        );
        assert_eq!(highlight("Deploy", Some("zzz"), plain, &theme), "Deploy");
        assert_eq!(highlight("Deploy", None, plain, &theme), "Deploy");
    }
}
