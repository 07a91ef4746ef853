//! Marker blocks for append-mode categories
//!
//! Append mode keeps the source content inside a delimited block so repeated
//! syncs update it in place instead of stacking copies:
//!
//! ```text
//! <!-- aicm:block:global -->
//! Be concise.
//! <!-- /aicm:block:global -->
//! ```

use std::ops::Range;

pub fn open_marker(category: &str) -> String {
    format!("<!-- aicm:block:{category} -->")
}

pub fn close_marker(category: &str) -> String {
    format!("<!-- /aicm:block:{category} -->")
}

/// A block for `category` with `body` between the markers, newline-terminated.
pub fn render_block(category: &str, body: &str) -> String {
    format!(
        "{}\n{}\n{}\n",
        open_marker(category),
        body,
        close_marker(category)
    )
}

/// Byte range between the markers of the first `category` block in `text`.
pub fn find_block(text: &str, category: &str) -> Option<Range<usize>> {
    let open = open_marker(category);
    let close = close_marker(category);

    let open_end = text.find(&open)? + open.len();
    let close_start = open_end + text[open_end..].find(&close)?;
    Some(open_end..close_start)
}

/// Body of a block given the text between its markers.
fn block_body(inner: &str) -> &str {
    inner
        .strip_prefix("\r\n")
        .or_else(|| inner.strip_prefix('\n'))
        .unwrap_or(inner)
        .trim_end_matches(['\n', '\r'])
}

/// Merge `source` into `before` for an append-mode category.
///
/// - blank source: `before` unchanged
/// - block present: body replaced when it differs (trailing newlines ignored)
/// - `before` already ends with the unmarked source text as whole lines: unchanged
/// - otherwise: a new block is appended after a blank line
pub fn merge_append(before: &str, source: &str, category: &str) -> String {
    let body = source.trim_end_matches(['\n', '\r']);
    if body.trim().is_empty() {
        return before.to_string();
    }

    if let Some(range) = find_block(before, category) {
        if block_body(&before[range.clone()]) == body {
            return before.to_string();
        }
        let mut merged = String::with_capacity(before.len() + body.len() + 2);
        merged.push_str(&before[..range.start]);
        merged.push('\n');
        merged.push_str(body);
        merged.push('\n');
        merged.push_str(&before[range.end..]);
        return merged;
    }

    if has_trailing_copy(before, body) {
        return before.to_string();
    }

    let block = render_block(category, body);
    if before.trim().is_empty() {
        block
    } else {
        format!("{}\n\n{}", before.trim_end(), block)
    }
}

/// Unmarked copy of `body` at the end of `before`, starting on a line of its own.
fn has_trailing_copy(before: &str, body: &str) -> bool {
    let text = before.trim_end();
    let body = body.trim();
    match text.strip_suffix(body) {
        Some(head) => {
            let head = head.trim_end_matches([' ', '\t']);
            head.is_empty() || head.ends_with('\n')
        }
        None => false,
    }
}
