//! Output file naming.

use crate::util::collapse_whitespace;

/// Default cap on sanitized title length, in characters.
pub const DEFAULT_MAX_FILE_NAME_CHARS: usize = 100;

/// Default minimum width of the zero-padded sequence number.
pub const DEFAULT_MIN_COUNTER_WIDTH: usize = 3;

/// Characters rejected in file names on at least one mainstream platform.
fn is_illegal(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c < ' '
}

/// Make `title` safe to use as a file name on any platform.
///
/// Illegal characters become `_`, whitespace runs collapse to one space,
/// and the result is trimmed and capped at `max_chars` characters.
///
/// ```
/// use chapterize::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("Chapter 1: Test", 100), "Chapter 1_ Test");
/// ```
pub fn sanitize_file_name(title: &str, max_chars: usize) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if is_illegal(c) { '_' } else { c })
        .collect();
    let collapsed = collapse_whitespace(&replaced);
    let trimmed = collapsed.trim();

    match trimmed.char_indices().nth(max_chars) {
        Some((end, _)) => trimmed[..end].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

/// Digits needed for sequence numbers in a book with `total` items.
pub fn counter_width(total: usize, min_width: usize) -> usize {
    let digits = total.checked_ilog10().map_or(1, |d| d as usize + 1);
    digits.max(min_width)
}

/// `"<NNN> - <title>.txt"`.
pub fn chapter_file_name(sequence: usize, width: usize, safe_title: &str) -> String {
    format!("{sequence:0width$} - {safe_title}.txt")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sanitize(title: &str) -> String {
        sanitize_file_name(title, DEFAULT_MAX_FILE_NAME_CHARS)
    }

    #[test]
    fn test_illegal_characters_replaced() {
        assert_eq!(sanitize("Chapter 1: Test"), "Chapter 1_ Test");
        assert_eq!(sanitize("Hello/World"), "Hello_World");
        assert_eq!(sanitize("Test<>File"), "Test__File");
        assert_eq!(sanitize(r#"What? "Yes" | No*\"#), "What_ _Yes_ _ No__");
        assert_eq!(sanitize("Tab\there"), "Tab_here");
    }

    #[test]
    fn test_whitespace_normalized() {
        assert_eq!(sanitize("Normal Title"), "Normal Title");
        assert_eq!(sanitize("  Spaces  Around  "), "Spaces Around");
        assert_eq!(sanitize("Non\u{a0}breaking  space"), "Non breaking space");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn test_long_names_truncated() {
        let long = "A".repeat(150);
        assert_eq!(sanitize(&long).chars().count(), 100);

        // Truncation never leaves trailing whitespace behind.
        let spaced = format!("{} tail", "B".repeat(99));
        assert_eq!(sanitize(&spaced), "B".repeat(99));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let long = "ư".repeat(120);
        let safe = sanitize(&long);
        assert_eq!(safe.chars().count(), 100);
    }

    #[test]
    fn test_counter_width() {
        assert_eq!(counter_width(0, 3), 3);
        assert_eq!(counter_width(10, 3), 3);
        assert_eq!(counter_width(999, 3), 3);
        assert_eq!(counter_width(1000, 3), 4);
        assert_eq!(counter_width(123_456, 3), 6);
        assert_eq!(counter_width(7, 1), 1);
    }

    #[test]
    fn test_chapter_file_name() {
        assert_eq!(chapter_file_name(7, 3, "Prologue"), "007 - Prologue.txt");
        assert_eq!(chapter_file_name(42, 4, "X"), "0042 - X.txt");
        assert_eq!(chapter_file_name(1234, 3, "Y"), "1234 - Y.txt");
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_bounded_and_clean(title in "\\PC{0,200}") {
            let safe = sanitize(&title);
            prop_assert!(safe.chars().count() <= DEFAULT_MAX_FILE_NAME_CHARS);
            prop_assert!(!safe.chars().any(is_illegal));
            prop_assert_eq!(safe.trim(), safe.as_str());
            prop_assert!(!safe.contains("  "));
        }
    }
}
