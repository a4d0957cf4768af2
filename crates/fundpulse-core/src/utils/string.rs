//! String helpers

/// Cut `s` to at most `max_chars` characters on a char boundary
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Cut `s` to `max_chars` characters and note how much was dropped.
///
/// Used for text that is fed back to the model, so the model can tell the
/// content was shortened.
pub fn truncate_with_notice(s: &str, max_chars: usize) -> String {
    let kept = truncate_str(s, max_chars);
    if kept.len() == s.len() {
        return s.to_string();
    }
    let dropped = s[kept.len()..].chars().count();
    format!("{}\n[truncated {} characters]", kept, dropped)
}
