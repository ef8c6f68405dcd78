//! Display, wrapping and filename-safe forms of node labels.
//!
//! All functions are pure; lengths are counted in characters.

use std::sync::OnceLock;

use regex::Regex;

/// Cut at the first `(` and trim trailing whitespace.
pub fn strip_parenthetical(s: &str) -> &str {
    match s.find('(') {
        Some(idx) => s[..idx].trim_end(),
        None => s.trim_end(),
    }
}

/// Insert line breaks so that no line exceeds `max_len` characters where a
/// delimiter allows it.
///
/// A line is broken after the last `/` within the window (the slash stays on
/// the first line) or else at the last space (the space is dropped). When the
/// window holds neither, the line is cut hard at `max_len`.
pub fn wrap_label(s: &str, max_len: usize, line_break: &str) -> String {
    if max_len == 0 {
        return s.to_string();
    }
    let mut lines: Vec<String> = Vec::new();
    let mut rest: Vec<char> = s.chars().collect();

    while rest.len() > max_len {
        let window = &rest[..max_len];
        let (head, tail): (String, Vec<char>) =
            if let Some(slash) = window.iter().rposition(|&c| c == '/') {
                (rest[..=slash].iter().collect(), rest[slash + 1..].to_vec())
            } else if let Some(space) = window.iter().rposition(|&c| c == ' ').filter(|&i| i > 0) {
                (rest[..space].iter().collect(), rest[space + 1..].to_vec())
            } else {
                (window.iter().collect(), rest[max_len..].to_vec())
            };
        lines.push(head);
        rest = tail;
    }
    lines.push(rest.into_iter().collect());
    lines.join(line_break)
}

/// Reference-prefixed, wrapped label for box and octagon nodes.
pub fn reference_label(reference: &str, label: &str, max_len: usize) -> String {
    let stripped = strip_parenthetical(label);
    let text = if reference.is_empty() {
        stripped.to_string()
    } else {
        format!("{}. {}", reference, stripped)
    };
    wrap_label(&text, max_len, "\n")
}

/// Answer cell label: stripped and wrapped.
pub fn answer_label(label: &str, max_len: usize) -> String {
    wrap_label(strip_parenthetical(label), max_len, "\n")
}

/// Wrap width used for the header cell of a question table.
pub fn question_wrap_len(label: &str) -> usize {
    let len = label.chars().count() as f64;
    ((len / 1.8).round() as usize).max(10)
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Filesystem and graph-ID safe form of a label.
///
/// `/` becomes `-`, commas are dropped, whitespace becomes `_`, everything
/// from the last `(` is removed and trailing underscores are trimmed.
pub fn sanitize_label(label: &str) -> String {
    let replaced = label.replace('/', "-").replace(',', "");
    let replaced = whitespace_re().replace_all(&replaced, "_");
    let cut = match replaced.rfind('(') {
        Some(idx) => &replaced[..idx],
        None => &replaced[..],
    };
    cut.trim_end_matches('_').to_string()
}

/// Sanitized label truncated to `max_len` characters, for file names.
pub fn file_label(label: &str, max_len: usize) -> String {
    let sanitized = sanitize_label(label);
    let truncated: String = sanitized.chars().take(max_len).collect();
    truncated.trim_end_matches('_').to_string()
}

/// Escape text for inclusion in a Graphviz HTML-like label.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '°' => out.push_str("&#176;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a double-quoted DOT string.
pub fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
