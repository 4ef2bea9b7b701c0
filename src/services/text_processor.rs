// Input Normalization
// Cleans text handed in by the front ends before it becomes the report's original text.

use regex::Regex;
use std::sync::OnceLock;

fn wide_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\u{3000}\u{00A0}\u{2007}\u{202F}]").expect("space regex"))
}

/// Unify line endings and exotic spaces, strip trailing blanks per line and
/// trim the whole text. Sentence punctuation is left untouched.
pub fn normalize_input(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let spaced = wide_space_re().replace_all(&unified, " ");

    spaced
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Whether the front end received anything worth analyzing.
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_and_spaces() {
        let raw = "  First line.\u{00A0}Next \r\nSecond\u{3000}line.\r\rEnd.  ";
        assert_eq!(normalize_input(raw), "First line. Next\nSecond line.\n\nEnd.");
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(normalize_input(""), "");
        assert_eq!(normalize_input(" \n\t "), "");
        assert!(!has_content(" \n "));
        assert!(has_content("x"));
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_input(" a \r\n b\u{202F}c \n");
        assert_eq!(normalize_input(&once), once);
    }
}
