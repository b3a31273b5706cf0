//! Text helpers shared across crates.

/// Truncate text to a maximum character count, adding ellipsis if needed.
///
/// Uses Unicode-aware character counting to handle multi-byte characters correctly.
///
/// # Examples
///
/// ```
/// use finqa_core::truncate;
///
/// assert_eq!(truncate("hello world", 8), "hello...");
/// assert_eq!(truncate("short", 10), "short");
/// ```
pub fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated.trim_end())
    }
}

/// Truncate text with total character count appended.
///
/// Useful for error messages where knowing the full size helps debugging.
///
/// ```
/// use finqa_core::truncate_with_count;
///
/// let long_text = "a".repeat(500);
/// let result = truncate_with_count(&long_text, 50);
/// assert!(result.ends_with("(500 chars total)"));
/// ```
pub fn truncate_with_count(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars total)", truncated.trim_end(), char_count)
    }
}
