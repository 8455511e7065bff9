//! Text cleanup and truncation helpers.
//!
//! Lengths are counted in characters, never bytes, so cuts always land on a
//! UTF-8 boundary.

use std::sync::OnceLock;

use regex::Regex;

/// Marker appended to text cut short.
pub const ELLIPSIS: &str = "...";

fn inline_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\u{a0}\r\f\v]+").expect("valid regex"))
}

fn blank_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// Normalizes extracted page text.
///
/// Trims every line, collapses inline whitespace runs to one space and keeps
/// at most one blank line between paragraphs.
pub fn clean_text(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut last_was_empty = false;

    for line in text.lines() {
        let line = inline_whitespace().replace_all(line.trim(), " ");
        if !line.is_empty() {
            lines.push(line.into_owned());
            last_was_empty = false;
        } else if !last_was_empty && !lines.is_empty() {
            lines.push(String::new());
            last_was_empty = true;
        }
    }

    let joined = lines.join("\n");
    blank_runs().replace_all(joined.trim(), "\n\n").into_owned()
}

/// Light cleanup for converted block text.
///
/// Unlike [`clean_text`] it keeps leading indentation, so preformatted code
/// survives; only trailing whitespace and extra blank lines are removed.
pub fn tidy_lines(text: &str) -> String {
    let joined = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    blank_runs().replace_all(joined.trim_matches('\n'), "\n\n").into_owned()
}

/// Byte offset of the `max`-th character, or `None` if `text` is shorter.
fn char_boundary(text: &str, max: usize) -> Option<usize> {
    text.char_indices().nth(max).map(|(idx, _)| idx)
}

/// Returns the first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match char_boundary(text, max) {
        Some(end) => &text[..end],
        None => text,
    }
}

/// Hard cut at `max` characters, appending [`ELLIPSIS`] if anything was cut.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    match char_boundary(text, max) {
        Some(end) => format!("{}{}", &text[..end], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Sentence-aware cut at `max` characters.
///
/// If the cut contains a sentence end (`". "`) past its midpoint, the text
/// ends there; otherwise it is hard cut with [`ELLIPSIS`].
pub fn summarize(text: &str, max: usize) -> String {
    let Some(end) = char_boundary(text, max) else {
        return text.to_string();
    };
    let truncated = &text[..end];
    let half = char_boundary(truncated, max / 2).unwrap_or(truncated.len());

    match truncated.rfind(". ") {
        Some(period) if period > half => truncated[..=period].to_string(),
        _ => format!("{}{}", truncated, ELLIPSIS),
    }
}
