//! Endpoint path templates.

use shared::domain::{display_string, Record};

/// Replaces every `:identifier` in `template` with the matching record field.
///
/// Missing records, missing fields and `null` all substitute an empty string.
/// Substituted values are not escaped.
pub fn interpolate(template: &str, record: Option<&Record>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if ch != ':' {
            out.push(ch);
            continue;
        }

        let mut end = start + 1;
        while let Some(&(idx, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                end = idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        if end == start + 1 {
            out.push(':');
            continue;
        }

        let name = &template[start + 1..end];
        if let Some(value) = record.and_then(|r| r.get(name)) {
            out.push_str(&display_string(value));
        }
    }

    out
}

/// Joins a screen base URL and an interpolated endpoint path with a single `/`.
/// An empty path yields the base unchanged.
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.is_empty() {
        return base_url.to_string();
    }
    if base_url.is_empty() {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
