//! Minimal `key: value` frontmatter handling for note files.
//!
//! Only flat scalar fields are understood. Unknown keys are preserved in
//! their original order when a block is rewritten.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frontmatter {
    fields: Vec<(String, String)>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.fields.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.fields.push((key.to_string(), value));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `[a, b]` and `a, b` are both accepted.
    pub fn list(&self, key: &str) -> Vec<String> {
        let Some(raw) = self.get(key) else {
            return Vec::new();
        };
        raw.trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|item| strip_quotes(item.trim()))
            .filter(|item| !item.is_empty())
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&quote_if_needed(value));
            out.push('\n');
        }
        out.push_str("---\n");
        out
    }
}

/// Splits a document into its frontmatter and body. Documents without a
/// well-formed block yield an empty frontmatter and the whole text as body.
pub fn parse(content: &str) -> (Frontmatter, String) {
    let normalized = content.replace("\r\n", "\n");
    let Some(remainder) = normalized.strip_prefix("---\n") else {
        return (Frontmatter::default(), normalized);
    };
    let (block, body) = if let Some(rest) = remainder.strip_prefix("---") {
        ("", rest)
    } else {
        match remainder.find("\n---") {
            Some(offset) => (&remainder[..offset], &remainder[offset + 4..]),
            None => return (Frontmatter::default(), normalized),
        }
    };
    let body = body.strip_prefix('\n').unwrap_or(body).to_string();

    let mut frontmatter = Frontmatter::default();
    for line in block.lines() {
        let mut parts = line.splitn(2, ':');
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let key = key.trim();
        if !is_valid_key(key) {
            continue;
        }
        frontmatter
            .fields
            .push((key.to_string(), strip_quotes(value.trim())));
    }
    (frontmatter, body)
}

/// Applies `updates` to the document's frontmatter, creating a block when the
/// document has none.
pub fn rewrite(content: &str, updates: &[(&str, &str)]) -> String {
    let (mut frontmatter, body) = parse(content);
    for (key, value) in updates {
        frontmatter.set(key, *value);
    }
    format!("{}{}", frontmatter.render(), body)
}

/// Lowercase, ASCII-only file name stem for a title.
pub fn slugify(title: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let re = NON_WORD.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));
    let lower = title.to_lowercase();
    let slug = re.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.chars().take(60).collect::<String>().trim_end_matches('-').to_string()
    }
}

/// First markdown `# ` heading in a body, if any.
pub fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().to_string())
        .filter(|heading| !heading.is_empty())
}

fn strip_quotes(value: &str) -> String {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'')
        {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.contains(": ")
        || value.starts_with(['\'', '"', '#', '&', '*', '!', '|', '>', '%', '@'])
        || value != value.trim();
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "'"))
    } else {
        value.to_string()
    }
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphanumeric() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}
