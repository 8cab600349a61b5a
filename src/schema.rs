//! Header inspection for roster exports.

use std::path::Path;

use crate::error::{Result, SplitError};
use crate::models::{
    CLASS_COLUMN, EMAIL_COLUMN, EMPLID_COLUMN, PLAN_COLUMN, REQUIRED_COLUMNS,
    STUDY_AGREEMENT_COLUMN, SUNET_COLUMN, TUITION_COLUMN,
};

/// Column layout of a roster export, fixed for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub has_study_agreement_column: bool,
}

impl Schema {
    /// Validates normalized header names and records whether the optional
    /// study agreement column is present.
    pub fn detect(headers: &[String], path: &Path) -> Result<Self> {
        if headers.iter().all(|h| h.is_empty()) {
            return Err(SplitError::unreadable(path, "no header row"));
        }
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(SplitError::MissingColumn {
                    column: column.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(Self {
            has_study_agreement_column: headers.iter().any(|h| h == STUDY_AGREEMENT_COLUMN),
        })
    }

    /// Header row of every class file produced under this schema.
    pub fn output_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![
            CLASS_COLUMN,
            EMPLID_COLUMN,
            EMAIL_COLUMN,
            "Last Name",
            "First Name",
            SUNET_COLUMN,
            TUITION_COLUMN,
            PLAN_COLUMN,
        ];
        if self.has_study_agreement_column {
            columns.push(STUDY_AGREEMENT_COLUMN);
        }
        columns
    }

    /// Title row naming the class, padded to the output width.
    pub fn title_row(&self, class_id: &str) -> Vec<String> {
        let mut row = vec![String::new(); self.output_columns().len()];
        row[0] = format!("Course: {}", class_id);
        row
    }
}

/// Trims header names and strips a leading byte order mark.
pub fn normalize_header(value: &str) -> String {
    value.trim_start_matches('\u{feff}').trim().to_string()
}
