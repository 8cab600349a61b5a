//! Error types for roster splitting.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while splitting a roster.
///
/// Fatal variants abort the whole run before any class file is written;
/// the rest are collected into the run report.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Source table missing, unopenable, or without a header row.
    #[error("cannot read source {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },

    /// Source table lacks one of the required columns.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// A single row could not be decoded or normalized.
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// A class file could not be created or written.
    #[error("failed to write {path}: {source}")]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The run directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    DestinationDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A selected filter label is not part of the configured vocabulary.
    #[error("unknown filter '{label}'")]
    UnknownFilter { label: String },

    /// Configuration file could not be read or parsed.
    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl SplitError {
    /// Returns true for errors that abort a run instead of being reported.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SplitError::MalformedRow { .. } | SplitError::DestinationWrite { .. }
        )
    }

    /// True for every way the source table can fail to load, including a
    /// missing required column.
    pub fn is_source_unreadable(&self) -> bool {
        matches!(
            self,
            SplitError::SourceUnreadable { .. } | SplitError::MissingColumn { .. }
        )
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SplitError::SourceUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
