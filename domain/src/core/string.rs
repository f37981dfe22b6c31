//! String utilities for the domain layer.

/// Truncate a string to at most `max_chars` characters, appending an ellipsis
/// when anything was cut.
///
/// Counts characters rather than bytes so multi-byte speech is never split.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = s.chars().take(keep).collect();
    out.push('…');
    out
}

/// Rough token estimate used for memory budgeting: one token per four
/// characters, rounded up.
pub fn estimate_tokens(s: &str) -> usize {
    s.chars().count().div_ceil(4)
}
