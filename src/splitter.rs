//! Writing one roster file per class.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::Writer;
use tracing::{debug, trace, warn};

use crate::classifier::{classify, Classification, FilterSpec};
use crate::dedupe::IdentityDeduplicator;
use crate::error::{Result, SplitError};
use crate::schema::Schema;
use crate::source::{LocatedRow, RowIssue};

/// Date and time labels captured once at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp {
    /// `MM-DD`, used in class file names.
    pub date: String,
    /// `MM-DD HH:MM:SS AM/PM`, used in the run directory name.
    pub date_time: String,
}

impl RunStamp {
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    pub fn at(moment: DateTime<Local>) -> Self {
        Self {
            date: moment.format("%m-%d").to_string(),
            date_time: moment.format("%m-%d %I:%M:%S %p").to_string(),
        }
    }
}

/// `Classes_<MM-DD HH:MM:SS AM/PM>`.
pub fn run_directory_name(stamp: &RunStamp) -> String {
    let name = format!("Classes_{}", stamp.date_time);
    if cfg!(windows) {
        name.replace(':', "-")
    } else {
        name
    }
}

/// `<class id without spaces> SCPD Roster <MM-DD>.csv`.
pub fn class_file_name(class_id: &str, date: &str) -> String {
    let safe_name = class_id.replace(' ', "").replace(['/', '\\'], "_");
    format!("{} SCPD Roster {}.csv", safe_name, date)
}

/// Creates the run directory under `destination`, reusing it if it already exists.
pub fn create_run_directory(destination: &Path, stamp: &RunStamp) -> Result<PathBuf> {
    let directory = destination.join(run_directory_name(stamp));
    fs::create_dir_all(&directory).map_err(|source| SplitError::DestinationDir {
        path: directory.clone(),
        source,
    })?;
    Ok(directory)
}

/// Result of writing one class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOutcome {
    pub class_id: String,
    pub path: PathBuf,
    pub rows_written: usize,
    pub duplicates_dropped: usize,
    pub excluded: usize,
    /// Rows that passed the filter but could not be normalized.
    pub issues: Vec<RowIssue>,
}

/// Inputs shared by every class of one run.
#[derive(Debug, Clone)]
pub struct ClassSplitter {
    pub schema: Schema,
    pub filter: FilterSpec,
    pub directory: PathBuf,
    pub date: String,
}

impl ClassSplitter {
    pub fn output_path(&self, class_id: &str) -> PathBuf {
        self.directory.join(class_file_name(class_id, &self.date))
    }

    /// Streams the file for `class_id`: title row, header row, then every
    /// admitted row in source order.
    pub fn write_class(&self, class_id: &str, rows: &[LocatedRow]) -> Result<ClassOutcome> {
        let path = self.output_path(class_id);
        let write_err = |source: csv::Error| SplitError::DestinationWrite {
            path: path.clone(),
            source,
        };

        let mut writer = Writer::from_path(&path).map_err(write_err)?;
        writer
            .write_record(self.schema.title_row(class_id))
            .map_err(write_err)?;
        writer
            .write_record(self.schema.output_columns())
            .map_err(write_err)?;

        let mut dedupe = IdentityDeduplicator::new();
        let mut outcome = ClassOutcome {
            class_id: class_id.to_string(),
            path: path.clone(),
            rows_written: 0,
            duplicates_dropped: 0,
            excluded: 0,
            issues: Vec::new(),
        };

        for located in rows {
            let classified = classify(
                &located.row,
                located.line,
                class_id,
                &self.filter,
                self.schema.has_study_agreement_column,
            );
            match classified {
                Ok(Classification::Included(record)) => {
                    if dedupe.admit(record.identity_key()) {
                        writer.write_record(record.to_fields()).map_err(write_err)?;
                        outcome.rows_written += 1;
                    } else {
                        trace!(
                            line = located.line,
                            emplid = %record.emplid,
                            "duplicate student row dropped"
                        );
                        outcome.duplicates_dropped += 1;
                    }
                }
                Ok(Classification::Excluded) => outcome.excluded += 1,
                Err(SplitError::MalformedRow { line, reason }) => {
                    warn!(class = %class_id, line, reason = %reason, "skipping malformed row");
                    outcome.issues.push(RowIssue {
                        line,
                        class_id: Some(class_id.to_string()),
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        writer.flush().map_err(|e| write_err(e.into()))?;
        debug!(
            class = %class_id,
            rows = outcome.rows_written,
            duplicates = outcome.duplicates_dropped,
            excluded = outcome.excluded,
            "class file written"
        );
        Ok(outcome)
    }
}
