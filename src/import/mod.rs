//! Book sources.
//!
//! The [`Importer`] trait is the seam between container formats and the
//! extraction pipeline: it supplies the reading order, the navigation tree
//! and raw chapter bytes. [`EpubImporter`] is the bundled implementation.

mod epub;

pub use epub::EpubImporter;

use std::io;

use percent_encoding::percent_decode_str;

use crate::book::{Metadata, TocEntry};
use crate::util::decode_document;

/// Unique identifier for a chapter/spine item within a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterId(pub u32);

/// Entry in the reading order (spine).
#[derive(Debug, Clone)]
pub struct SpineEntry {
    /// Unique identifier for this chapter.
    pub id: ChapterId,
}

/// Access to a book's structure and chapter content.
pub trait Importer {
    /// Book metadata (title, authors, etc.).
    fn metadata(&self) -> &Metadata;

    /// Table of contents. Empty when the book has no navigation.
    fn toc(&self) -> &[TocEntry];

    /// Reading order (spine).
    fn spine(&self) -> &[SpineEntry];

    /// Internal path of a chapter (e.g. "OEBPS/text/ch01.xhtml").
    ///
    /// TOC hrefs use the same path space, so the two compare directly once
    /// fragments are stripped.
    fn source_id(&self, id: ChapterId) -> Option<&str>;

    /// Raw bytes of a chapter.
    fn load_raw(&mut self, id: ChapterId) -> io::Result<Vec<u8>>;

    /// Chapter markup decoded to text, honoring the document's declared
    /// encoding.
    fn load_markup(&mut self, id: ChapterId) -> io::Result<String> {
        let bytes = self.load_raw(id)?;
        Ok(decode_document(&bytes).into_owned())
    }
}

/// Resolve `href` (relative to the document at `base`) to a container path.
///
/// The path part is percent-decoded and `.`/`..` segments are collapsed; a
/// fragment, if any, is kept verbatim. Fragment-only hrefs point back into
/// `base`.
pub(crate) fn resolve_href(base: &str, href: &str) -> String {
    let (path, fragment) = match href.find('#') {
        Some(i) => (&href[..i], Some(&href[i..])),
        None => (href, None),
    };

    let mut resolved = if path.is_empty() {
        base.to_string()
    } else {
        let path = percent_decode_str(path).decode_utf8_lossy();
        let joined = match path.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => match base.rfind('/') {
                Some(i) => format!("{}/{}", &base[..i], path),
                None => path.into_owned(),
            },
        };
        normalize_segments(&joined)
    };

    if let Some(fragment) = fragment {
        resolved.push_str(fragment);
    }
    resolved
}

fn normalize_segments(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
