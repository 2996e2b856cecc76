use unicode_width::UnicodeWidthStr;

/// Terminal column width of `text`; CJK stock names take two columns per glyph.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Shorten a response body so error logs stay on one screen.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }

    let mut shortened: String = trimmed.chars().take(max_chars).collect();
    shortened.push_str("...");
    shortened
}
