use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Clean up the text of a single decoded span.
///
/// Applies unicode normalization, ligature replacement, replacement
/// character removal, control character removal, and whitespace collapsing.
/// Leading and trailing spaces are kept so that word boundaries produced by
/// the content stream survive until line assembly.
pub fn cleanup_span_text(text: &str) -> String {
    // 1. Unicode NFC normalization.
    let mut result: String = text.nfc().collect();

    // 2. Fix ligatures.
    let ligatures = [
        ('\u{FB00}', "ff"),
        ('\u{FB01}', "fi"),
        ('\u{FB02}', "fl"),
        ('\u{FB03}', "ffi"),
        ('\u{FB04}', "ffl"),
        ('\u{FB05}', "st"),
        ('\u{FB06}', "st"),
    ];
    if result.chars().any(|c| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
        for (lig, replacement) in &ligatures {
            result = result.replace(*lig, replacement);
        }
    }

    // 3. Remove the Unicode replacement character and control characters.
    //    Tabs and newlines become spaces first.
    result = result
        .chars()
        .filter_map(|c| match c {
            '\t' | '\n' | '\r' => Some(' '),
            '\u{FFFD}' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();

    // 4. Collapse runs of whitespace (including NBSP) to a single space.
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"[\s\u{00A0}]{2,}").unwrap());
    re_spaces.replace_all(&result, " ").into_owned()
}

/// Collapse whitespace and trim, producing the canonical form used to
/// compare line texts.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(cleanup_span_text("Hello world."), "Hello world.");
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(cleanup_span_text("\u{FB01}nd"), "find");
    }

    #[test]
    fn test_ligature_ffl() {
        assert_eq!(cleanup_span_text("a\u{FB04}e"), "affle");
    }

    #[test]
    fn test_ligature_st() {
        assert_eq!(cleanup_span_text("fa\u{FB06}"), "fast");
    }

    #[test]
    fn test_replacement_char_removed() {
        assert_eq!(cleanup_span_text("Hello\u{FFFD}World"), "HelloWorld");
    }

    #[test]
    fn test_control_chars_removed() {
        assert_eq!(cleanup_span_text("a\u{0001}b\u{0008}c"), "abc");
    }

    #[test]
    fn test_whitespace_collapsed_but_edges_kept() {
        assert_eq!(cleanup_span_text(" a \t\n b "), " a b ");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(cleanup_span_text(""), "");
    }

    #[test]
    fn test_nfc_normalization() {
        // e + combining acute should normalize to single char.
        let result = cleanup_span_text("caf\u{0065}\u{0301}");
        assert_eq!(result, "caf\u{00E9}");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  1.  Introduction \u{00A0} "), "1. Introduction");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
