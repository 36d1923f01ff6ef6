/// Trims whitespace and strips one pair of surrounding quotes from user input.
///
/// Pasted URLs frequently arrive as `"https://..."` or with a trailing
/// newline; both are harmless and should not fail validation.
pub fn normalize_user_input(input: &str) -> &str {
    let trimmed = input.trim();

    let unquoted = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    unquoted.trim()
}

/// Returns the first `max_chars` characters of `text` and whether anything
/// was cut. Never splits a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Character count, as opposed to `str::len` which counts bytes
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
