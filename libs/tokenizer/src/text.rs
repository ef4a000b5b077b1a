//! Text normalization and word symbolization

use crate::WORD_END;
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run into a single ASCII space and trim both ends.
///
/// Content is otherwise untouched: no case folding, no composition. Callers
/// loading a corpus are expected to apply NFC before this step.
pub fn normalize(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Split a word into one symbol per character followed by the end marker.
///
/// An empty word yields just the end marker.
pub fn symbolize(word: &str) -> Vec<String> {
    let mut symbols: Vec<String> = word.chars().map(|c| c.to_string()).collect();
    symbols.push(WORD_END.to_string());
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("hello   world"), "hello world");
        assert_eq!(normalize("hello\t\nworld"), "hello world");
        assert_eq!(normalize("  padded  "), "padded");
    }

    #[test]
    fn test_normalize_keeps_content() {
        assert_eq!(normalize("Hello Wörld"), "Hello Wörld");
        assert_eq!(normalize("తెలుగు  భాష"), "తెలుగు భాష");
    }

    #[test]
    fn test_normalize_unicode_whitespace() {
        // no-break space and ideographic space are whitespace too
        assert_eq!(normalize("a\u{00A0}\u{3000}b"), "a b");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "",
            "   ",
            "one",
            " a  b\tc\n\nd ",
            "తెలుగు \r\n లో  వాక్యాలు",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn test_symbolize_word() {
        assert_eq!(symbolize("abc"), vec!["a", "b", "c", WORD_END]);
    }

    #[test]
    fn test_symbolize_empty_word() {
        assert_eq!(symbolize(""), vec![WORD_END]);
    }

    #[test]
    fn test_symbolize_splits_code_points() {
        // "తె" is two code points: consonant + vowel sign
        assert_eq!(symbolize("తె"), vec!["త", "ె", WORD_END]);
    }
}
