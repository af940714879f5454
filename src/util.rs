/// Find the largest byte offset <= `max_bytes` that falls on a UTF-8 char boundary.
pub(crate) fn floor_char_boundary(text: &str, max_bytes: usize) -> usize {
    if max_bytes >= text.len() {
        return text.len();
    }
    // Walk backwards from max_bytes until we hit a char boundary
    let mut i = max_bytes;
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Truncate a string to at most `max_bytes` bytes without splitting a character.
pub fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    &text[..floor_char_boundary(text, max_bytes)]
}

/// Keep the first `max_chars` characters (Unicode scalar values) of `text`.
///
/// Character-based limits in config (`max_diff_length`, `max_response_chars`)
/// count characters, not bytes.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
