//! EPUB importer: ZIP container, OPF package and navigation.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::book::{Metadata, TocEntry};
use crate::epub::{parse_container_xml, parse_nav_toc, parse_ncx, parse_opf};
use crate::import::{ChapterId, Importer, SpineEntry, resolve_href};
use crate::util::decode_document;

/// EPUB importer over any seekable reader.
pub struct EpubImporter<R> {
    archive: ZipArchive<R>,

    /// Lower-cased entry name -> actual entry name, for sloppy hrefs.
    folded_names: HashMap<String, String>,

    metadata: Metadata,
    toc: Vec<TocEntry>,
    spine: Vec<SpineEntry>,

    /// Maps ChapterId -> ZIP path (e.g., "OEBPS/text/ch01.xhtml").
    spine_paths: Vec<String>,
}

impl EpubImporter<BufReader<File>> {
    /// Open an EPUB file on disk.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Importer for EpubImporter<R> {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    fn spine(&self) -> &[SpineEntry] {
        &self.spine
    }

    fn source_id(&self, id: ChapterId) -> Option<&str> {
        self.spine_paths.get(id.0 as usize).map(|s| s.as_str())
    }

    fn load_raw(&mut self, id: ChapterId) -> io::Result<Vec<u8>> {
        let path = self
            .spine_paths
            .get(id.0 as usize)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Chapter ID {} not found", id.0),
                )
            })?;
        self.read_entry(&path)
    }
}

impl<R: Read + Seek> EpubImporter<R> {
    /// Read the package structure from a ZIP stream.
    pub fn from_reader(reader: R) -> io::Result<Self> {
        // 1. Index entry names
        let archive = ZipArchive::new(reader)?;
        let folded_names = archive
            .file_names()
            .map(|name| (name.to_lowercase(), name.to_string()))
            .collect();

        let mut importer = Self {
            archive,
            folded_names,
            metadata: Metadata::default(),
            toc: Vec::new(),
            spine: Vec::new(),
            spine_paths: Vec::new(),
        };

        // 2. Find OPF path from container.xml
        let container = importer.read_entry("META-INF/container.xml")?;
        let opf_path = parse_container_xml(&container)?;

        // 3. Parse OPF
        let opf_bytes = importer.read_entry(&opf_path)?;
        let opf = parse_opf(&decode_document(&opf_bytes))?;

        // 4. Build spine
        for spine_id in &opf.spine_ids {
            let Some(href) = opf.manifest.get(spine_id) else {
                debug!(idref = %spine_id, "spine item missing from manifest");
                continue;
            };
            let full_path = resolve_href(&opf_path, href);

            importer.spine.push(SpineEntry {
                id: ChapterId(importer.spine_paths.len() as u32),
            });
            importer.spine_paths.push(full_path);
        }

        // 5. Navigation: EPUB 3 nav document first, NCX as fallback
        let nav_doc = opf.nav_href.as_ref().map(|h| (resolve_href(&opf_path, h), true));
        let ncx_doc = opf.ncx_href.as_ref().map(|h| (resolve_href(&opf_path, h), false));
        for (toc_path, is_nav) in nav_doc.into_iter().chain(ncx_doc) {
            match importer.read_toc(&toc_path, is_nav) {
                Ok(toc) if !toc.is_empty() => {
                    importer.toc = toc;
                    break;
                }
                Ok(_) => debug!(path = %toc_path, "navigation document has no entries"),
                Err(e) => warn!(path = %toc_path, error = %e, "unreadable navigation document"),
            }
        }

        importer.metadata = opf.metadata;
        Ok(importer)
    }

    fn read_toc(&mut self, toc_path: &str, is_nav: bool) -> io::Result<Vec<TocEntry>> {
        let bytes = self.read_entry(toc_path)?;
        let text = decode_document(&bytes);
        let entries = if is_nav {
            parse_nav_toc(&text)?
        } else {
            parse_ncx(&text)?
        };
        Ok(resolve_toc_hrefs(entries, toc_path))
    }

    /// Actual ZIP entry name for `path`, matching case-insensitively as a
    /// fallback.
    fn entry_name(&self, path: &str) -> Option<String> {
        if self.archive.index_for_name(path).is_some() {
            return Some(path.to_string());
        }
        self.folded_names.get(&path.to_lowercase()).cloned()
    }

    /// Read and decompress a ZIP entry by path.
    fn read_entry(&mut self, path: &str) -> io::Result<Vec<u8>> {
        let name = self.entry_name(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found in ZIP: {}", path),
            )
        })?;

        let mut file = self.archive.by_name(&name)?;
        let mut out = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Rewrite TOC hrefs, which are relative to the navigation document, into
/// container paths.
fn resolve_toc_hrefs(entries: Vec<TocEntry>, toc_path: &str) -> Vec<TocEntry> {
    entries
        .into_iter()
        .map(|entry| TocEntry {
            href: if entry.href.is_empty() {
                entry.href
            } else {
                resolve_href(toc_path, &entry.href)
            },
            children: resolve_toc_hrefs(entry.children, toc_path),
            ..entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_toc_hrefs_nested() {
        let entries = vec![
            TocEntry::new("Part I", "text/part1.xhtml")
                .with_child(TocEntry::new("Chapter 1", "text/ch1.xhtml#sec1")),
            TocEntry::new("Heading only", ""),
        ];

        let result = resolve_toc_hrefs(entries, "OEBPS/toc.ncx");

        assert_eq!(result[0].href, "OEBPS/text/part1.xhtml");
        assert_eq!(result[0].children[0].href, "OEBPS/text/ch1.xhtml#sec1");
        assert_eq!(result[1].href, "");
    }

    #[test]
    fn test_resolve_toc_hrefs_from_subdirectory() {
        let entries = vec![TocEntry::new("Chapter 1", "../Text/ch1.xhtml")];

        let result = resolve_toc_hrefs(entries, "OEBPS/Nav/nav.xhtml");

        assert_eq!(result[0].href, "OEBPS/Text/ch1.xhtml");
    }
}
