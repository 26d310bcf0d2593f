//! Book-level data supplied by importers.

/// Book metadata (Dublin Core subset).
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub identifier: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
}

/// A table of contents entry (hierarchical).
///
/// `href` is the target content path as the importer resolved it and may
/// carry a `#fragment`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
    pub children: Vec<TocEntry>,
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

impl TocEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TocEntry) -> Self {
        self.children.push(child);
        self
    }

    /// Total number of entries in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TocEntry::count).sum::<usize>()
    }
}
