//! Telegram MarkdownV2 helpers.

/// Escape special characters for Telegram MarkdownV2 format
///
/// Escapes every character with meaning in MarkdownV2:
/// _ * [ ] ( ) ~ ` > # + - = | { } . !
///
/// # Example
/// ```ignore
/// use crate::utils::markdown::escape;
///
/// assert_eq!(escape("e621.net/posts/1"), "e621\\.net/posts/1");
/// ```
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '_'
                | '*'
                | '['
                | ']'
                | '('
                | ')'
                | '~'
                | '`'
                | '>'
                | '#'
                | '+'
                | '-'
                | '='
                | '|'
                | '{'
                | '}'
                | '.'
                | '!'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wrap already-escaped text in spoiler markup.
pub fn spoiler(escaped: &str) -> String {
    format!("||{}||", escaped)
}

/// Inline link; inside the url only `)` and `\` need escaping.
pub fn link(label: &str, url: &str) -> String {
    let url = url.replace('\\', "\\\\").replace(')', "\\)");
    format!("[{}]({})", escape(label), url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(escape("Hello World"), "Hello World");
        assert_eq!(escape("rating:safe"), "rating:safe");
        assert_eq!(escape("big_fox"), "big\\_fox");
        assert_eq!(
            escape("https://e621.net/posts/5"),
            "https://e621\\.net/posts/5"
        );
    }

    #[test]
    fn test_escape_backslash() {
        assert_eq!(escape("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_spoiler() {
        assert_eq!(spoiler("x\\.y"), "||x\\.y||");
    }

    #[test]
    fn test_link() {
        assert_eq!(
            link("manage feed", "https://example.net/a_(b)"),
            "[manage feed](https://example.net/a_(b\\))"
        );
    }
}
