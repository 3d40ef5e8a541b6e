/// Bounds a string before it goes into a log line.
///
/// Counts characters, not bytes, so truncation never lands inside a
/// multi-byte sequence.
pub(crate) fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str(&format!("... ({total} chars total)"));
    truncated
}
