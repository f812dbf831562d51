use ammonia;

/// Clean comment content using the ammonia library.
///
/// Whitelist-based sanitization: preserves safe tags while stripping
/// dangerous ones (like <script>) and malicious attributes (like onclick).
/// This is the fail-safe against stored XSS for every client that renders
/// comment bodies as HTML.
pub fn clean_content(input: &str) -> String {
    ammonia::clean(input)
}
