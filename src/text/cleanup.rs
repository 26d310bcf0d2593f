//! Line-level cleanup for converted chapter text.
//!
//! Chapter bodies often open with a page number left over from print
//! layout, and then repeat the chapter title a few lines further down
//! (once in the heading, again in a styled paragraph). Both are removed
//! here.

use unicode_normalization::UnicodeNormalization;

use crate::util::is_integer;

/// How many lines after the first are searched for a restated title.
pub const DUPLICATE_WINDOW: usize = 9;

/// First lines longer than this (in characters) also match by prefix.
const PREFIX_MATCH_MIN_CHARS: usize = 5;

/// Remove leading numeric lines, then collapse a restated title.
///
/// If one of the [`DUPLICATE_WINDOW`] lines after the first equals the
/// first line, or starts with it (case-insensitively), every line from the
/// second through that match is dropped.
///
/// The prefix rule is a heuristic: "Chapter 1" also swallows a later
/// "Chapter 10" line and everything between.
pub fn clean_header_lines(lines: &mut Vec<String>) {
    let numeric = lines.iter().take_while(|line| is_integer(line)).count();
    lines.drain(..numeric);

    if lines.len() <= 1 {
        return;
    }

    let first = fold(&lines[0]);
    let allow_prefix = first.chars().count() > PREFIX_MATCH_MIN_CHARS;

    let duplicate = lines
        .iter()
        .enumerate()
        .skip(1)
        .take(DUPLICATE_WINDOW)
        .find(|(_, line)| {
            let line = fold(line);
            line == first || (allow_prefix && line.starts_with(&first))
        })
        .map(|(i, _)| i);

    if let Some(k) = duplicate {
        lines.drain(1..=k);
    }
}

fn fold(line: &str) -> String {
    line.nfc().collect::<String>().to_lowercase()
}
