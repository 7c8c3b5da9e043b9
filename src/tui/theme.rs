/// Styling for the browser screen. Every field wraps already-measured text in
/// ANSI codes, so width math happens before styling.
#[derive(Clone, Copy)]
pub struct BrowserTheme {
    pub header: fn(&str) -> String,
    pub workspace: fn(&str) -> String,
    pub ecosystem: fn(&str) -> String,
    pub group: fn(&str) -> String,
    pub note: fn(&str) -> String,
    pub archived: fn(&str) -> String,
    pub separator: fn(&str) -> String,
    pub prefix: fn(&str) -> String,
    pub count: fn(&str) -> String,
    pub jump_key: fn(&str) -> String,
    pub selected: fn(&str) -> String,
    pub cut: fn(&str) -> String,
    pub matched: fn(&str) -> String,
    pub cursor_bg: fn(&str) -> String,
    pub dim: fn(&str) -> String,
    pub prompt: fn(&str) -> String,
    pub status: fn(&str) -> String,
    pub error: fn(&str) -> String,
}

impl Default for BrowserTheme {
    fn default() -> Self {
        Self {
            header: |s| format!("\x1b[1m{s}\x1b[22m"),
            workspace: |s| format!("\x1b[1;34m{s}\x1b[22;39m"),
            ecosystem: |s| format!("\x1b[1;35m{s}\x1b[22;39m"),
            group: |s| format!("\x1b[33m{s}\x1b[39m"),
            note: |s| s.to_string(),
            archived: |s| format!("\x1b[2;3m{s}\x1b[22;23m"),
            separator: |s| format!("\x1b[2m{s}\x1b[22m"),
            prefix: |s| format!("\x1b[90m{s}\x1b[39m"),
            count: |s| format!("\x1b[2m{s}\x1b[22m"),
            jump_key: |s| format!("\x1b[36m{s}\x1b[39m"),
            selected: |s| format!("\x1b[32m{s}\x1b[39m"),
            cut: |s| format!("\x1b[9m{s}\x1b[29m"),
            matched: |s| format!("\x1b[4;33m{s}\x1b[24;39m"),
            cursor_bg: |s| format!("\x1b[48;5;236m{s}\x1b[49m"),
            dim: |s| format!("\x1b[2m{s}\x1b[22m"),
            prompt: |s| format!("\x1b[1;36m{s}\x1b[22;39m"),
            status: |s| format!("\x1b[32m{s}\x1b[39m"),
            error: |s| format!("\x1b[31m{s}\x1b[39m"),
        }
    }
}
