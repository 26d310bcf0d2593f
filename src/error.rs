//! Error types for chapter extraction.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop an extraction run.
///
/// Per-chapter problems that only prevent naming a chapter are not errors;
/// they surface as skipped items instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read chapter {item}: {source}")]
    Read {
        item: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
