//! Chapter extraction: one text file per titled chapter.
//!
//! [`Extraction`] walks the reading order one item per `next()`, so a caller
//! can report progress or stop at any chapter boundary. [`extract_book`]
//! drains it with a callback.

use std::fs;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::import::{ChapterId, Importer};
use crate::nav::{NavigationMap, strip_anchor};
use crate::naming::{
    DEFAULT_MAX_FILE_NAME_CHARS, DEFAULT_MIN_COUNTER_WIDTH, chapter_file_name, counter_width,
    sanitize_file_name,
};
use crate::text::html_to_text;
use crate::title::{
    AbsenceReason, DEFAULT_TITLE_SCAN_CHARS, GenericTitles, TitleResolution, TitleResolver,
};

/// Default minimum chapter length, in UTF-16 code units.
pub const DEFAULT_MIN_TEXT_LEN: usize = 50;

/// Status reported for chapters without a usable title.
pub const SKIPPED_NO_TITLE: &str = "Skipped (No Title)";

/// Extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Chapters whose text is shorter than this are skipped.
    pub min_text_len: usize,
    /// Characters of markup searched for a heading title.
    pub title_scan_chars: usize,
    pub max_file_name_chars: usize,
    pub min_counter_width: usize,
    pub generic_titles: GenericTitles,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_text_len: DEFAULT_MIN_TEXT_LEN,
            title_scan_chars: DEFAULT_TITLE_SCAN_CHARS,
            max_file_name_chars: DEFAULT_MAX_FILE_NAME_CHARS,
            min_counter_width: DEFAULT_MIN_COUNTER_WIDTH,
            generic_titles: GenericTitles::default(),
        }
    }
}

impl ExtractConfig {
    pub fn with_min_text_len(mut self, min_text_len: usize) -> Self {
        self.min_text_len = min_text_len;
        self
    }

    pub fn with_title_scan_chars(mut self, title_scan_chars: usize) -> Self {
        self.title_scan_chars = title_scan_chars;
        self
    }

    pub fn with_max_file_name_chars(mut self, max_file_name_chars: usize) -> Self {
        self.max_file_name_chars = max_file_name_chars;
        self
    }

    pub fn with_min_counter_width(mut self, min_counter_width: usize) -> Self {
        self.min_counter_width = min_counter_width;
        self
    }

    pub fn with_generic_titles(mut self, generic_titles: GenericTitles) -> Self {
        self.generic_titles = generic_titles;
        self
    }
}

/// What happened to one item of the reading order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ItemOutcome {
    Written {
        sequence: usize,
        title: String,
        path: PathBuf,
    },
    SkippedNoTitle {
        reason: String,
    },
    SkippedTooShort {
        title: String,
        length: usize,
    },
}

/// Progress report for one item of the reading order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct ProgressEvent {
    /// Chapter title, or a "Skipped" message.
    pub status: String,
    /// Share of the reading order processed so far, 0 to 100.
    pub percent: f64,
    pub outcome: ItemOutcome,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub written: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Iterator over the reading order that writes one file per kept chapter.
///
/// Yields one event per item. After an error it yields nothing more; files
/// already written stay in place.
pub struct Extraction<'a, I: ?Sized> {
    importer: &'a mut I,
    config: &'a ExtractConfig,
    out_dir: PathBuf,
    navigation: NavigationMap,
    chapters: Vec<ChapterId>,
    width: usize,
    position: usize,
    written: usize,
    failed: bool,
}

impl<'a, I: Importer + ?Sized> Extraction<'a, I> {
    /// Prepare a run, creating `out_dir` (and its parents) if needed.
    pub fn new(
        importer: &'a mut I,
        out_dir: impl Into<PathBuf>,
        config: &'a ExtractConfig,
    ) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir).map_err(|source| Error::OutputDir {
            path: out_dir.clone(),
            source,
        })?;

        let navigation = NavigationMap::new(importer.toc());
        let chapters: Vec<ChapterId> = importer.spine().iter().map(|entry| entry.id).collect();
        let width = counter_width(chapters.len(), config.min_counter_width);
        debug!(
            chapters = chapters.len(),
            toc_paths = navigation.len(),
            out_dir = %out_dir.display(),
            "starting extraction"
        );

        Ok(Self {
            importer,
            config,
            out_dir,
            navigation,
            chapters,
            width,
            position: 0,
            written: 0,
            failed: false,
        })
    }

    /// Number of items in the reading order.
    pub fn total(&self) -> usize {
        self.chapters.len()
    }

    /// Files written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn process(&mut self, id: ChapterId, percent: f64) -> Result<ProgressEvent> {
        let key = strip_anchor(self.importer.source_id(id).unwrap_or_default()).to_string();
        let markup = self.importer.load_markup(id);

        let resolver = TitleResolver::new(&self.navigation, &self.config.generic_titles)
            .with_scan_chars(self.config.title_scan_chars);
        let resolution = resolver.resolve(&key, markup.as_ref().map(String::as_str));

        let title = match resolution {
            TitleResolution::Resolved { title, source } => {
                debug!(item = %key, ?source, %title, "resolved title");
                title
            }
            TitleResolution::Absent(reason) => {
                match &reason {
                    AbsenceReason::Unreadable(e) => {
                        warn!(item = %key, error = %e, "skipping unreadable chapter")
                    }
                    AbsenceReason::NoCandidate => debug!(item = %key, "no usable title"),
                }
                return Ok(ProgressEvent {
                    status: SKIPPED_NO_TITLE.to_string(),
                    percent,
                    outcome: ItemOutcome::SkippedNoTitle {
                        reason: reason.to_string(),
                    },
                });
            }
        };

        let markup = markup.map_err(|source| Error::Read {
            item: key.clone(),
            source,
        })?;
        let text = html_to_text(&markup);

        let length = text.encode_utf16().count();
        if length < self.config.min_text_len {
            debug!(item = %key, length, "chapter too short");
            return Ok(ProgressEvent {
                status: format!("Skipped: {title}"),
                percent,
                outcome: ItemOutcome::SkippedTooShort { title, length },
            });
        }

        let sequence = self.written + 1;
        let safe_title = sanitize_file_name(&title, self.config.max_file_name_chars);
        let path = self
            .out_dir
            .join(chapter_file_name(sequence, self.width, &safe_title));
        fs::write(&path, text.as_bytes()).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;
        self.written = sequence;
        debug!(item = %key, path = %path.display(), "wrote chapter");

        Ok(ProgressEvent {
            status: title.clone(),
            percent,
            outcome: ItemOutcome::Written {
                sequence,
                title,
                path,
            },
        })
    }
}

impl<I: Importer + ?Sized> Iterator for Extraction<'_, I> {
    type Item = Result<ProgressEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let id = *self.chapters.get(self.position)?;
        self.position += 1;
        let percent = self.position as f64 / self.chapters.len() as f64 * 100.0;

        let event = self.process(id, percent);
        if event.is_err() {
            self.failed = true;
        }
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.chapters.len() - self.position;
        (0, Some(remaining))
    }
}

impl<I: Importer + ?Sized> FusedIterator for Extraction<'_, I> {}

/// Extract every titled chapter of `importer` into `out_dir`.
///
/// `on_progress` is called once per item, in reading order.
pub fn extract_book<I: Importer + ?Sized>(
    importer: &mut I,
    out_dir: impl AsRef<Path>,
    config: &ExtractConfig,
    mut on_progress: impl FnMut(&ProgressEvent),
) -> Result<ExtractSummary> {
    let extraction = Extraction::new(importer, out_dir.as_ref(), config)?;
    let mut summary = ExtractSummary {
        total: extraction.total(),
        ..ExtractSummary::default()
    };

    for event in extraction {
        let event = event?;
        match event.outcome {
            ItemOutcome::Written { .. } => summary.written += 1,
            _ => summary.skipped += 1,
        }
        on_progress(&event);
    }

    info!(
        written = summary.written,
        skipped = summary.skipped,
        total = summary.total,
        "extraction finished"
    );
    Ok(summary)
}
