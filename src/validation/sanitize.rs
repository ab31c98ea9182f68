//! Free-text sanitization.

/// Maximum length (in characters) kept by [`sanitize_input`].
pub const MAX_INPUT_LENGTH: usize = 64;

/// Trim, strip `< > ' "` and truncate to [`MAX_INPUT_LENGTH`] characters.
///
/// Used for free-text fields before they enter a signed payload or a
/// storage key.
pub fn sanitize_input(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"'))
        .take(MAX_INPUT_LENGTH)
        .collect()
}

/// Escape `& < > " ' /` so a user-supplied string can be rendered as markup.
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}
