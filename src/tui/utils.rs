use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Length in bytes of the CSI sequence starting at `pos`, if one starts there.
fn csi_len(text: &str, pos: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(pos) != Some(&b'\x1b') || bytes.get(pos + 1) != Some(&b'[') {
        return None;
    }
    bytes[pos + 2..]
        .iter()
        .position(|byte| matches!(byte, b'm' | b'G' | b'K' | b'H' | b'J'))
        .map(|offset| offset + 3)
}

/// Removes SGR and cursor sequences, leaving only printable text.
pub fn strip_ansi(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        if let Some(len) = csi_len(text, i) {
            i += len;
            continue;
        }
        let Some(ch) = text[i..].chars().next() else {
            break;
        };
        if ch == '\t' {
            output.push_str("   ");
        } else {
            output.push(ch);
        }
        i += ch.len_utf8();
    }
    output
}

pub fn visible_width(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    if text.bytes().all(|byte| (0x20..=0x7e).contains(&byte)) {
        return text.len();
    }
    let clean = strip_ansi(text);
    UnicodeSegmentation::graphemes(clean.as_str(), true)
        .map(UnicodeWidthStr::width)
        .sum()
}

enum Segment<'a> {
    Ansi(&'a str),
    Grapheme(&'a str),
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < text.len() {
        if let Some(len) = csi_len(text, i) {
            out.push(Segment::Ansi(&text[i..i + len]));
            i += len;
            continue;
        }
        let mut end = i;
        while end < text.len() && csi_len(text, end).is_none() {
            end += text[end..].chars().next().map_or(1, char::len_utf8);
        }
        out.extend(
            UnicodeSegmentation::graphemes(&text[i..end], true)
                .filter(|grapheme| !grapheme.is_empty())
                .map(Segment::Grapheme),
        );
        i = end;
    }
    out
}

pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    truncate_to_width_with_ellipsis(text, max_width, "...")
}

/// Cuts `text` to at most `max_width` columns, keeping escape sequences
/// intact and appending `ellipsis` when anything was dropped.
pub fn truncate_to_width_with_ellipsis(text: &str, max_width: usize, ellipsis: &str) -> String {
    if visible_width(text) <= max_width {
        return text.to_string();
    }

    let ellipsis_width = visible_width(ellipsis);
    let target_width = max_width.saturating_sub(ellipsis_width);
    if target_width == 0 {
        return ellipsis.chars().take(max_width).collect();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for segment in segments(text) {
        match segment {
            Segment::Ansi(code) => result.push_str(code),
            Segment::Grapheme(grapheme) => {
                let width = UnicodeWidthStr::width(grapheme);
                if current_width + width > target_width {
                    break;
                }
                result.push_str(grapheme);
                current_width += width;
            }
        }
    }
    format!("{result}\x1b[0m{ellipsis}")
}

/// Right-pads `text` with spaces to `width` columns.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(text));
    format!("{text}{}", " ".repeat(padding))
}

/// Truncates with a one-column ellipsis, then pads: always exactly `width`
/// columns wide.
pub fn fit_to_width(text: &str, width: usize) -> String {
    pad_to_width(&truncate_to_width_with_ellipsis(text, width, "…"), width)
}

pub fn apply_background_to_line<F>(line: &str, width: usize, bg_fn: F) -> String
where
    F: Fn(&str) -> String,
{
    bg_fn(&pad_to_width(line, width))
}
