//! Key identifiers.
//!
//! Keys are named the way bindings are written: printable characters as
//! themselves (`"j"`, `"G"`, `"?"`), named keys in lowercase (`"enter"`,
//! `"esc"`, `"pageup"`), and modifiers joined with `+` (`"ctrl+d"`).
//!
//! # API
//! - `key_id(event)` - Name a crossterm key event
//! - `matches_key(id, key_id)` - Compare an id against a binding, with aliases
//! - `text_char(id)` - The character a key inserts into a text field

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Names a key event. Returns `None` for releases and keys with no binding
/// vocabulary (media keys, bare modifiers).
pub fn key_id(event: &KeyEvent) -> Option<String> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = event.modifiers.contains(KeyModifiers::ALT);

    let base = match event.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(ch) if ctrl || alt => ch.to_ascii_lowercase().to_string(),
        KeyCode::Char(ch) => return Some(ch.to_string()),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "shift+tab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };

    let mut id = String::new();
    if ctrl {
        id.push_str("ctrl+");
    }
    if alt {
        id.push_str("alt+");
    }
    id.push_str(&base);
    Some(id)
}

/// True when `id` names the binding `key`. `escape`/`esc` and
/// `return`/`enter` are treated as the same key.
pub fn matches_key(id: &str, key: &str) -> bool {
    canonical(id) == canonical(key)
}

fn canonical(key: &str) -> &str {
    match key {
        "escape" => "esc",
        "return" => "enter",
        " " => "space",
        other => other,
    }
}

/// Character inserted into a text field by `id`, if any.
pub fn text_char(id: &str) -> Option<char> {
    if id == "space" {
        return Some(' ');
    }
    let mut chars = id.chars();
    let ch = chars.next()?;
    if chars.next().is_some() || ch.is_control() {
        return None;
    }
    Some(ch)
}
