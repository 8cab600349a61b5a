//! Reading the roster export and partitioning it by class.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::error::{Result, SplitError};
use crate::models::SourceRow;
use crate::schema::{normalize_header, Schema};

/// A source row together with the line it was read from.
#[derive(Debug, Clone)]
pub struct LocatedRow {
    pub line: u64,
    pub row: SourceRow,
}

/// A row that was skipped instead of processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub line: u64,
    /// Class the row belonged to, when that much could be decoded.
    pub class_id: Option<String>,
    pub reason: String,
}

/// Open roster export with its header already inspected.
pub struct RosterSource {
    path: PathBuf,
    schema: Schema,
    reader: Reader<File>,
}

impl RosterSource {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SplitError::unreadable(path, "file not found"));
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| SplitError::unreadable(path, e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| SplitError::unreadable(path, e))?
            .iter()
            .map(normalize_header)
            .collect();
        let schema = Schema::detect(&headers, path)?;
        reader.set_headers(StringRecord::from(headers));

        debug!(
            path = %path.display(),
            study_agreement = schema.has_study_agreement_column,
            "roster header inspected"
        );
        Ok(Self {
            path: path.to_path_buf(),
            schema,
            reader,
        })
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Reads every row once, grouping rows by class in source order.
    ///
    /// Rows that cannot be decoded are skipped and reported, never fatal.
    pub fn partition(mut self) -> Result<ClassPartition> {
        let headers = self
            .reader
            .headers()
            .map_err(|e| SplitError::unreadable(&self.path, e))?
            .clone();

        let mut partition = ClassPartition {
            schema: self.schema,
            classes: BTreeMap::new(),
            issues: Vec::new(),
        };

        for result in self.reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    if let csv::ErrorKind::Io(_) = e.kind() {
                        return Err(SplitError::unreadable(&self.path, e));
                    }
                    warn!(line, error = %e, "skipping undecodable row");
                    partition.issues.push(RowIssue {
                        line,
                        class_id: None,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            match record.deserialize::<SourceRow>(Some(&headers)) {
                Ok(row) => partition
                    .classes
                    .entry(row.class_id.clone())
                    .or_default()
                    .push(LocatedRow { line, row }),
                Err(e) => {
                    warn!(line, error = %e, "skipping undecodable row");
                    partition.issues.push(RowIssue {
                        line,
                        class_id: None,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            classes = partition.classes.len(),
            skipped = partition.issues.len(),
            "roster partitioned"
        );
        Ok(partition)
    }
}

/// Rows of one roster export grouped by class id.
#[derive(Debug)]
pub struct ClassPartition {
    pub schema: Schema,
    classes: BTreeMap<String, Vec<LocatedRow>>,
    pub issues: Vec<RowIssue>,
}

impl ClassPartition {
    /// Distinct class ids present in the source, sorted.
    pub fn class_ids(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    pub fn rows_for(&self, class_id: &str) -> &[LocatedRow] {
        self.classes.get(class_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_classes(self) -> impl Iterator<Item = (String, Vec<LocatedRow>)> {
        self.classes.into_iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Returns the schema of the roster at `path`.
pub fn detect_schema(path: &Path) -> Result<Schema> {
    Ok(RosterSource::open(path)?.schema())
}

/// Returns the distinct class ids of the roster at `path`.
pub fn enumerate_classes(path: &Path) -> Result<Vec<String>> {
    Ok(RosterSource::open(path)?.partition()?.class_ids())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Term Code,Course Offering Subject-Num Desc,EMPLID,Preferred Email Address,Last First Name,Tuition Group Desc,Stu Current Acad Plan Code,SUNet ID";

    fn write_source(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}\n{}", HEADER, body).unwrap();
        file
    }

    #[test]
    fn partitions_in_source_order() {
        let file = write_source(
            "1246,CS 106A,1,a@x.edu,\"A, Ann\",SCPD NDO,GR-NDO,ann\n\
             1246,AA 203,2,b@x.edu,\"B, Bob\",SCPD NDO,GR-NDO,bob\n\
             1246,CS 106A,3,c@x.edu,\"C, Cat\",SCPD NDO,GR-NDO,cat\n",
        );
        let partition = RosterSource::open(file.path()).unwrap().partition().unwrap();
        assert!(!partition.schema.has_study_agreement_column);
        assert_eq!(partition.class_ids(), vec!["AA 203", "CS 106A"]);
        let emplids: Vec<_> = partition
            .rows_for("CS 106A")
            .iter()
            .map(|r| r.row.emplid.as_str())
            .collect();
        assert_eq!(emplids, vec!["1", "3"]);
        assert_eq!(partition.rows_for("CS 106A")[1].line, 4);
    }

    #[test]
    fn short_rows_are_reported_and_skipped() {
        let file = write_source(
            "1246,CS 106A,1,a@x.edu,\"A, Ann\",SCPD NDO,GR-NDO,ann\n\
             1246,CS 106A,2\n",
        );
        let partition = RosterSource::open(file.path()).unwrap().partition().unwrap();
        assert_eq!(partition.rows_for("CS 106A").len(), 1);
        assert_eq!(partition.issues.len(), 1);
        assert_eq!(partition.issues[0].line, 3);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = RosterSource::open(Path::new("/nonexistent/roster.csv")).err().unwrap();
        assert!(matches!(err, SplitError::SourceUnreadable { .. }));
    }

    #[test]
    fn detects_schema_from_path() {
        let file = write_source("1246,CS 106A,1,a@x.edu,\"A, Ann\",SCPD NDO,GR-NDO,ann\n");
        assert!(!detect_schema(file.path()).unwrap().has_study_agreement_column);

        let mut with_column = tempfile::NamedTempFile::new().unwrap();
        write!(
            with_column,
            "{},Study Agreement Code\n1246,CS 106A,1,a@x.edu,\"A, Ann\",SCPD NDO,GR-NDO,ann,-\n",
            HEADER
        )
        .unwrap();
        assert!(detect_schema(with_column.path()).unwrap().has_study_agreement_column);

        let mut short = tempfile::NamedTempFile::new().unwrap();
        write!(short, "Course Offering Subject-Num Desc,EMPLID\nCS 106A,1\n").unwrap();
        let err = detect_schema(short.path()).unwrap_err();
        assert!(err.is_source_unreadable());
    }

    #[test]
    fn enumerates_distinct_classes() {
        let file = write_source(
            "1246,CS 106A,1,a@x.edu,\"A, Ann\",SCPD NDO,GR-NDO,ann\n\
             1246,CS 106A,1,a@x.edu,\"A, Ann\",SCPD NDO,CS-MS,ann\n",
        );
        assert_eq!(enumerate_classes(file.path()).unwrap(), vec!["CS 106A"]);
    }
}
