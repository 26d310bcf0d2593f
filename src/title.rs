//! Chapter title resolution.
//!
//! A chapter is named from its table-of-contents entry when that entry is
//! informative, and otherwise from the first `h1`, `h2` or `h3` near the top
//! of the document. Anything that looks like a page number, a two-letter
//! label or a "Contents"/"Cover" placeholder is rejected as generic.

use std::collections::HashSet;
use std::fmt;
use std::io;

use unicode_normalization::UnicodeNormalization;

use crate::dom::parse_html;
use crate::nav::NavigationMap;
use crate::util::{collapse_whitespace, is_integer};

/// Default number of characters of markup inspected for headings.
pub const DEFAULT_TITLE_SCAN_CHARS: usize = 3000;

const DEFAULT_GENERIC_TITLES: &[&str] = &[
    // English
    "toc",
    "table of contents",
    "contents",
    "cover",
    "title page",
    "copyright",
    // Vietnamese
    "mục lục",
    "bìa",
    "trang bìa",
    // French
    "table des matières",
    "sommaire",
    "couverture",
    // German
    "inhaltsverzeichnis",
    "inhalt",
    // Spanish
    "índice",
    "portada",
];

/// Set of titles too uninformative to name a chapter file with.
///
/// Matching is case-insensitive and ignores Unicode composition differences.
#[derive(Debug, Clone)]
pub struct GenericTitles {
    words: HashSet<String>,
}

impl Default for GenericTitles {
    fn default() -> Self {
        Self::empty().with_all(DEFAULT_GENERIC_TITLES.iter().copied())
    }
}

impl GenericTitles {
    /// A set with no placeholder words; only the structural rules apply.
    pub fn empty() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    pub fn with(mut self, title: &str) -> Self {
        self.insert(title);
        self
    }

    pub fn with_all<'a>(mut self, titles: impl IntoIterator<Item = &'a str>) -> Self {
        for title in titles {
            self.insert(title);
        }
        self
    }

    pub fn insert(&mut self, title: &str) {
        let key = fold(title);
        if !key.is_empty() {
            self.words.insert(key);
        }
    }

    /// True if `title` is blank, numeric, at most two characters long, or a
    /// known placeholder.
    pub fn is_generic(&self, title: &str) -> bool {
        let trimmed = title.trim();
        trimmed.is_empty()
            || is_integer(trimmed)
            || trimmed.chars().count() <= 2
            || self.words.contains(&fold(trimmed))
    }
}

fn fold(title: &str) -> String {
    title.trim().nfc().collect::<String>().to_lowercase()
}

/// Where a resolved title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Navigation,
    /// Heading level, 1 to 3.
    Heading(u8),
}

/// Why no title could be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsenceReason {
    /// Neither the TOC nor the leading headings had a usable title.
    NoCandidate,
    /// The chapter content could not be read.
    Unreadable(String),
}

impl fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsenceReason::NoCandidate => f.write_str("no usable title"),
            AbsenceReason::Unreadable(e) => write!(f, "content unreadable: {e}"),
        }
    }
}

/// Outcome of title resolution for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleResolution {
    Resolved { title: String, source: TitleSource },
    Absent(AbsenceReason),
}

impl TitleResolution {
    pub fn title(&self) -> Option<&str> {
        match self {
            TitleResolution::Resolved { title, .. } => Some(title),
            TitleResolution::Absent(_) => None,
        }
    }
}

/// Picks chapter titles from navigation data and leading headings.
#[derive(Debug, Clone)]
pub struct TitleResolver<'a> {
    navigation: &'a NavigationMap,
    generic: &'a GenericTitles,
    scan_chars: usize,
}

impl<'a> TitleResolver<'a> {
    pub fn new(navigation: &'a NavigationMap, generic: &'a GenericTitles) -> Self {
        Self {
            navigation,
            generic,
            scan_chars: DEFAULT_TITLE_SCAN_CHARS,
        }
    }

    pub fn with_scan_chars(mut self, scan_chars: usize) -> Self {
        self.scan_chars = scan_chars;
        self
    }

    /// Resolve the title for the chapter at `path_key`.
    ///
    /// `markup` is the chapter content, or the error hit while loading it.
    /// A load error only matters when the TOC has no usable title, and even
    /// then it is reported as [`AbsenceReason::Unreadable`] rather than
    /// propagated.
    pub fn resolve(&self, path_key: &str, markup: Result<&str, &io::Error>) -> TitleResolution {
        if let Some(title) = self.navigation.get(path_key)
            && !self.generic.is_generic(title)
        {
            return TitleResolution::Resolved {
                title: title.to_string(),
                source: TitleSource::Navigation,
            };
        }

        match markup {
            Ok(markup) => self.from_headings(markup),
            Err(e) => TitleResolution::Absent(AbsenceReason::Unreadable(e.to_string())),
        }
    }

    /// Title from the first `h1`, else first `h2`, else first `h3` within
    /// the leading part of `markup`.
    pub fn from_headings(&self, markup: &str) -> TitleResolution {
        let head = match markup.char_indices().nth(self.scan_chars) {
            Some((end, _)) => &markup[..end],
            None => markup,
        };

        let dom = parse_html(head);
        let root = dom.body_or_root();

        for (level, tag) in [(1, "h1"), (2, "h2"), (3, "h3")] {
            let Some(heading) = dom.find_by_tag(root, tag) else {
                continue;
            };
            let text = dom.inner_text(heading);
            let text = collapse_whitespace(text.trim());
            if !self.generic.is_generic(&text) {
                return TitleResolution::Resolved {
                    title: text.into_owned(),
                    source: TitleSource::Heading(level),
                };
            }
        }

        TitleResolution::Absent(AbsenceReason::NoCandidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::TocEntry;

    fn resolved(title: &str, source: TitleSource) -> TitleResolution {
        TitleResolution::Resolved {
            title: title.to_string(),
            source,
        }
    }

    #[test]
    fn test_generic_titles() {
        let generic = GenericTitles::default();
        for title in [
            "", "   ", "1", "123", " 42 ", "ab", "toc", "TOC", "Table of Contents", "Mục lục",
            "cover", "Cover", "Bìa", "Title Page", "Copyright", "  Sommaire ",
        ] {
            assert!(generic.is_generic(title), "{title:?} should be generic");
        }
    }

    #[test]
    fn test_informative_titles() {
        let generic = GenericTitles::default();
        for title in [
            "Chapter 1: Introduction",
            "Chương 1: Hắn chính là một viên tro bụi",
            "Prologue",
            "Epilogue",
            "Part One",
            "abc",
        ] {
            assert!(!generic.is_generic(title), "{title:?} should not be generic");
        }
    }

    #[test]
    fn test_generic_match_ignores_composition() {
        // "Mục lục" spelled with combining marks
        let decomposed: String = "Mục lục".nfd().collect();
        assert!(GenericTitles::default().is_generic(&decomposed));
    }

    #[test]
    fn test_generic_set_is_extensible() {
        let generic = GenericTitles::default().with("Lời tựa");
        assert!(generic.is_generic("LỜI TỰA"));
        assert!(!GenericTitles::empty().is_generic("Contents"));
    }

    #[test]
    fn test_navigation_title_wins() {
        let nav = NavigationMap::new(&[TocEntry::new("Chapter One", "OEBPS/ch1.xhtml#top")]);
        let generic = GenericTitles::default();
        let resolver = TitleResolver::new(&nav, &generic);

        let markup = "<body><h1>Heading Title</h1></body>";
        assert_eq!(
            resolver.resolve("oebps/CH1.xhtml", Ok(markup)),
            resolved("Chapter One", TitleSource::Navigation)
        );
    }

    #[test]
    fn test_generic_navigation_title_falls_back_to_heading() {
        let nav = NavigationMap::new(&[TocEntry::new("Cover", "cover.xhtml")]);
        let generic = GenericTitles::default();
        let resolver = TitleResolver::new(&nav, &generic);

        let markup = "<html><body><h1>  The   Long\n Night </h1></body></html>";
        assert_eq!(
            resolver.resolve("cover.xhtml", Ok(markup)),
            resolved("The Long Night", TitleSource::Heading(1))
        );
    }

    #[test]
    fn test_heading_priority_and_first_match_only() {
        let nav = NavigationMap::default();
        let generic = GenericTitles::default();
        let resolver = TitleResolver::new(&nav, &generic);

        // The first h1 is generic; the second h1 is never consulted.
        let markup = "<body><h3>Third</h3><h1>12</h1><h2>Second Level</h2><h1>Later One</h1></body>";
        assert_eq!(
            resolver.from_headings(markup),
            resolved("Second Level", TitleSource::Heading(2))
        );
    }

    #[test]
    fn test_heading_entities_are_decoded() {
        let nav = NavigationMap::default();
        let generic = GenericTitles::default();
        let resolver = TitleResolver::new(&nav, &generic);

        let markup = "<h2>Tom &amp; Jerry&nbsp;Return</h2>";
        assert_eq!(resolver.from_headings(markup).title(), Some("Tom & Jerry Return"));
    }

    #[test]
    fn test_headings_beyond_scan_window_are_ignored() {
        let nav = NavigationMap::default();
        let generic = GenericTitles::default();
        let resolver = TitleResolver::new(&nav, &generic);

        let markup = format!("<body><p>{}</p><h1>Too Late</h1></body>", "x".repeat(4000));
        assert_eq!(
            resolver.from_headings(&markup),
            TitleResolution::Absent(AbsenceReason::NoCandidate)
        );

        let wide = resolver.clone().with_scan_chars(10_000);
        assert_eq!(wide.from_headings(&markup).title(), Some("Too Late"));
    }

    #[test]
    fn test_xhtml_empty_title_does_not_hide_headings() {
        let nav = NavigationMap::default();
        let generic = GenericTitles::default();
        let resolver = TitleResolver::new(&nav, &generic);

        let markup = r#"<?xml version="1.0"?><html xmlns="http://www.w3.org/1999/xhtml"><head><title/></head><body><h2>Homecoming</h2></body></html>"#;
        assert_eq!(
            resolver.from_headings(markup),
            resolved("Homecoming", TitleSource::Heading(2))
        );
    }

    #[test]
    fn test_no_heading_is_absent() {
        let nav = NavigationMap::default();
        let generic = GenericTitles::default();
        let resolver = TitleResolver::new(&nav, &generic);

        assert_eq!(
            resolver.resolve("x.xhtml", Ok("<p>Just text</p>")),
            TitleResolution::Absent(AbsenceReason::NoCandidate)
        );
        assert_eq!(resolver.from_headings("").title(), None);
    }

    #[test]
    fn test_unreadable_content_is_absorbed() {
        let nav = NavigationMap::default();
        let generic = GenericTitles::default();
        let resolver = TitleResolver::new(&nav, &generic);

        let err = io::Error::new(io::ErrorKind::InvalidData, "corrupt deflate stream");
        let outcome = resolver.resolve("x.xhtml", Err(&err));
        assert_eq!(
            outcome,
            TitleResolution::Absent(AbsenceReason::Unreadable("corrupt deflate stream".into()))
        );
    }
}
