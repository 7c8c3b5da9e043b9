use crate::browser::node::{DisplayNode, NodeKind};
use std::collections::HashSet;
use std::ops::Range;
use std::path::PathBuf;

/// Substring filter over note titles and types and group display names.
/// Matching ignores case; workspaces only survive as ancestors.
pub fn matches_query(node: &DisplayNode, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    match &node.kind {
        NodeKind::Note(note) => {
            note.title.to_lowercase().contains(&needle)
                || note.note_type.to_lowercase().contains(&needle)
        }
        NodeKind::Group { .. } => node.label().to_lowercase().contains(&needle),
        NodeKind::Workspace(_) | NodeKind::Separator { .. } => false,
    }
}

/// Content-search filter: notes whose path the search reported.
pub fn matches_hits(node: &DisplayNode, hits: &HashSet<PathBuf>) -> bool {
    node.note().is_some_and(|note| hits.contains(&note.path))
}

/// Byte range of the first case-insensitive occurrence of `query` in `text`.
pub fn match_span(text: &str, query: &str) -> Option<Range<usize>> {
    let needle: Vec<char> = query.trim().to_lowercase().chars().collect();
    if needle.is_empty() {
        return None;
    }
    for (start, _) in text.char_indices() {
        let mut matched = 0;
        let mut end = start;
        for (offset, ch) in text[start..].char_indices() {
            if matched == needle.len() {
                break;
            }
            let mut lower = ch.to_lowercase();
            let (Some(folded), None) = (lower.next(), lower.next()) else {
                break;
            };
            if folded != needle[matched] {
                break;
            }
            matched += 1;
            end = start + offset + ch.len_utf8();
        }
        if matched == needle.len() {
            return Some(start..end);
        }
    }
    None
}
