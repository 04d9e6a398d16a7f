// Text Processing Service
// Normalization shared by pattern matching and quote selection

use regex::Regex;
use std::sync::OnceLock;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Fold quotes and dashes to ASCII, collapse whitespace runs, lower-case.
/// Rules and review bodies both pass through here before matching.
pub fn normalize_for_matching(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}', '\u{02bc}'], "'")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace(['\u{00a0}', '\u{3000}'], " ");

    whitespace_re()
        .replace_all(s.trim(), " ")
        .to_lowercase()
}

/// Trim a review body for display: collapse whitespace but keep case.
pub fn display_quote(text: &str) -> String {
    whitespace_re().replace_all(text.trim(), " ").to_string()
}

/// Short single-line preview, char-bounded.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_case_and_whitespace() {
        let input = "  I\u{2019}m  a\tNURSE\n\nand   love these ";
        assert_eq!(normalize_for_matching(input), "i'm a nurse and love these");
    }

    #[test]
    fn test_normalize_blank_is_empty() {
        assert_eq!(normalize_for_matching(""), "");
        assert_eq!(normalize_for_matching(" \n\t "), "");
    }

    #[test]
    fn test_display_quote_keeps_case() {
        assert_eq!(display_quote(" So   Comfortable!\n"), "So Comfortable!");
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("héllo world", 5), "héllo...");
        assert_eq!(preview("short", 10), "short");
    }
}
