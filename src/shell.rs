// POSIX shell quoting for command strings sent through an executor

use std::borrow::Cow;

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',')
}

/// Quotes `s` so the shell passes it through as a single literal word.
pub fn quote(s: &str) -> Cow<'_, str> {
    if !s.is_empty() && s.chars().all(is_safe) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    Cow::Owned(out)
}

/// Here-doc delimiter that does not collide with any line of `content`.
pub fn heredoc_delimiter(content: &str) -> String {
    let mut delim = "EOL".to_string();
    while content.lines().any(|l| l == delim) {
        delim.push('_');
    }
    delim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_words_pass_through() {
        assert_eq!(quote("web-container"), "web-container");
        assert_eq!(quote("/opt/services/web"), "/opt/services/web");
    }

    #[test]
    fn unsafe_words_are_single_quoted() {
        assert_eq!(quote(""), "''");
        assert_eq!(quote("{{.Names}}"), "'{{.Names}}'");
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote("it's"), "'it'\\''s'");
        assert_eq!(quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn heredoc_delimiter_avoids_content_lines() {
        assert_eq!(heredoc_delimiter("a: 1\n"), "EOL");
        assert_eq!(heredoc_delimiter("x\nEOL\ny"), "EOL_");
    }
}
