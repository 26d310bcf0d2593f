//! Path → title lookup built from the table of contents.

use std::collections::HashMap;

use crate::book::TocEntry;

/// The part of `path` before the first `#`.
///
/// ```
/// use chapterize::strip_anchor;
///
/// assert_eq!(strip_anchor("text/ch1.xhtml#p4"), "text/ch1.xhtml");
/// assert_eq!(strip_anchor("#top"), "");
/// ```
pub fn strip_anchor(path: &str) -> &str {
    match memchr::memchr(b'#', path.as_bytes()) {
        Some(i) => &path[..i],
        None => path,
    }
}

/// Case-insensitive map from anchor-stripped content path to TOC title.
///
/// Built by a pre-order walk of the TOC tree; the first entry pointing at a
/// file names it, so a part heading wins over the sections nested under it
/// when both target the same file.
#[derive(Debug, Clone, Default)]
pub struct NavigationMap {
    titles: HashMap<String, String>,
}

impl NavigationMap {
    pub fn new(toc: &[TocEntry]) -> Self {
        let mut map = Self::default();
        map.visit(toc);
        map
    }

    fn visit(&mut self, entries: &[TocEntry]) {
        for entry in entries {
            let title = entry.title.trim();
            if !entry.href.is_empty() && !title.is_empty() {
                self.titles
                    .entry(fold_key(strip_anchor(&entry.href)))
                    .or_insert_with(|| title.to_string());
            }
            self.visit(&entry.children);
        }
    }

    /// Title for an (already anchor-stripped) content path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.titles.get(&fold_key(path)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

fn fold_key(path: &str) -> String {
    path.to_lowercase()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_strip_anchor() {
        assert_eq!(strip_anchor("chapter1.xhtml#section1"), "chapter1.xhtml");
        assert_eq!(strip_anchor("chapter1.xhtml#"), "chapter1.xhtml");
        assert_eq!(strip_anchor("chapter1.xhtml"), "chapter1.xhtml");
        assert_eq!(strip_anchor("path/to/chapter.xhtml#a#b"), "path/to/chapter.xhtml");
        assert_eq!(strip_anchor("#onlyanchor"), "");
        assert_eq!(strip_anchor(""), "");
    }

    #[test]
    fn test_first_entry_wins() {
        let toc = vec![
            TocEntry::new("Part One", "text/part1.xhtml")
                .with_child(TocEntry::new("Opening", "text/part1.xhtml#s1")),
            TocEntry::new("Later Duplicate", "text/PART1.xhtml"),
        ];

        let map = NavigationMap::new(&toc);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("text/part1.xhtml"), Some("Part One"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let map = NavigationMap::new(&[TocEntry::new("Mở đầu", "OEBPS/Text/Intro.xhtml")]);

        assert_eq!(map.get("oebps/text/intro.xhtml"), Some("Mở đầu"));
        assert_eq!(map.get("OEBPS/TEXT/INTRO.XHTML"), Some("Mở đầu"));
        assert_eq!(map.get("OEBPS/Text/Other.xhtml"), None);
    }

    #[test]
    fn test_deep_children_are_flattened() {
        let toc = vec![TocEntry::new("Book", "").with_child(
            TocEntry::new("Part", "p.xhtml").with_child(
                TocEntry::new("Chapter", "c.xhtml").with_child(TocEntry::new("Scene", "s.xhtml#x")),
            ),
        )];

        let map = NavigationMap::new(&toc);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get("s.xhtml"), Some("Scene"));
    }

    #[test]
    fn test_blank_titles_do_not_claim_a_path() {
        let toc = vec![
            TocEntry::new("   ", "ch1.xhtml"),
            TocEntry::new("  Chapter One  ", "ch1.xhtml#start"),
        ];

        let map = NavigationMap::new(&toc);

        assert_eq!(map.get("ch1.xhtml"), Some("Chapter One"));
    }

    proptest! {
        #[test]
        fn prop_strip_anchor_is_idempotent(path in ".*") {
            let once = strip_anchor(&path);
            prop_assert_eq!(strip_anchor(once), once);
            prop_assert!(!once.contains('#'));
            prop_assert!(path.starts_with(once));
        }
    }
}
