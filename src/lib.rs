//! # chapterize
//!
//! Split an EPUB into one plain-text file per chapter.
//!
//! ## Features
//!
//! - Chapter titles from the table of contents (EPUB 3 nav or NCX), falling
//!   back to the first heading of each chapter
//! - Placeholder titles ("Contents", "Cover", page numbers) are ignored
//! - Markup flattened to paragraphs with scripts and hidden blocks removed
//! - Leading page numbers and restated titles trimmed from chapter text
//! - Portable, zero-padded file names: `001 - Chapter Title.txt`
//!
//! ## Quick Start
//!
//! ```no_run
//! use chapterize::{EpubImporter, ExtractConfig, extract_book};
//!
//! let mut book = EpubImporter::open("novel.epub").unwrap();
//! let config = ExtractConfig::default();
//! let summary = extract_book(&mut book, "novel", &config, |event| {
//!     println!("[{:5.1}%] {}", event.percent, event.status);
//! })
//! .unwrap();
//! println!("{} chapters written", summary.written);
//! ```
//!
//! ## Driving the pipeline yourself
//!
//! [`Extraction`] is an iterator yielding one [`ProgressEvent`] per item of
//! the reading order; dropping it stops the run between chapters. Any source
//! implementing [`Importer`] can be extracted.

pub mod book;
pub mod dom;
pub mod epub;
pub mod error;
pub mod extract;
pub mod import;
pub mod nav;
pub mod naming;
pub mod text;
pub mod title;
pub(crate) mod util;

pub use book::{Metadata, TocEntry};
pub use error::{Error, Result};
pub use extract::{
    ExtractConfig, ExtractSummary, Extraction, ItemOutcome, ProgressEvent, extract_book,
};
pub use import::{ChapterId, EpubImporter, Importer, SpineEntry};
pub use nav::{NavigationMap, strip_anchor};
pub use naming::sanitize_file_name;
pub use text::{clean_header_lines, html_to_text};
pub use title::{GenericTitles, TitleResolution, TitleResolver, TitleSource};
