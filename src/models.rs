use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SplitError};

pub const CLASS_COLUMN: &str = "Course Offering Subject-Num Desc";
pub const EMPLID_COLUMN: &str = "EMPLID";
pub const EMAIL_COLUMN: &str = "Preferred Email Address";
pub const NAME_COLUMN: &str = "Last First Name";
pub const SUNET_COLUMN: &str = "SUNet ID";
pub const TUITION_COLUMN: &str = "Tuition Group Desc";
pub const PLAN_COLUMN: &str = "Stu Current Acad Plan Code";
pub const STUDY_AGREEMENT_COLUMN: &str = "Study Agreement Code";

/// Columns every roster export must carry.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    CLASS_COLUMN,
    EMPLID_COLUMN,
    EMAIL_COLUMN,
    NAME_COLUMN,
    SUNET_COLUMN,
    TUITION_COLUMN,
    PLAN_COLUMN,
];

/// Reserved filter label selecting cross-program (overseas/exchange) students.
pub const BOSP_LABEL: &str = "BOSP";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter labels a caller may select. `BOSP` is the cross-program switch,
    /// everything else is matched against the tuition group.
    pub filter_options: Vec<String>,
    pub output_directory: Option<String>,
    /// Upper bound on concurrently processed classes. Defaults to the core count.
    pub workers: Option<usize>,
    /// Reject filter labels outside `filter_options` instead of warning.
    pub strict_filters: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter_options: vec![
                "Honor's Coop - Engineering".to_string(),
                "Honor's Coop - Regular".to_string(),
                "SCPD NDO".to_string(),
                BOSP_LABEL.to_string(),
            ],
            output_directory: None,
            workers: None,
            strict_filters: true,
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(file_path).map_err(|e| SplitError::Config {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| SplitError::Config {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save_to_file(&self, file_path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    /// Loads the file when it exists, otherwise falls back to the defaults.
    pub fn load_or_default(file_path: &Path) -> Result<Self> {
        if file_path.exists() {
            Self::load_from_file(file_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// One line of the roster export: a student enrolled in a class under one academic plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceRow {
    #[serde(rename = "Course Offering Subject-Num Desc")]
    pub class_id: String,
    #[serde(rename = "EMPLID")]
    pub emplid: String,
    #[serde(rename = "Preferred Email Address")]
    pub email: String,
    #[serde(rename = "Last First Name")]
    pub last_first_name: String,
    #[serde(rename = "SUNet ID")]
    pub sunet_id: String,
    #[serde(rename = "Tuition Group Desc")]
    pub tuition_group: String,
    #[serde(rename = "Stu Current Acad Plan Code")]
    pub acad_plan: String,
    #[serde(rename = "Study Agreement Code", default)]
    pub study_agreement: Option<String>,
}

impl SourceRow {
    /// True when the study agreement code starts with `O` or `X`.
    pub fn is_cross_program(&self) -> bool {
        self.study_agreement
            .as_deref()
            .and_then(|code| code.chars().next())
            .is_some_and(|c| c == 'O' || c == 'X')
    }
}

/// Normalized projection of a [`SourceRow`] as written to a class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub class_id: String,
    pub emplid: String,
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    pub sunet_id: String,
    pub tuition_group: String,
    pub acad_plan: String,
    /// `Some("BOSP")` or `Some("")` when the source carries a study agreement column,
    /// `None` when it does not.
    pub cross_program: Option<String>,
}

impl OutputRecord {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            class_id: self.class_id.clone(),
            emplid: self.emplid.clone(),
            email: self.email.clone(),
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
            sunet_id: self.sunet_id.clone(),
        }
    }

    pub fn to_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.class_id.as_str(),
            self.emplid.as_str(),
            self.email.as_str(),
            self.last_name.as_str(),
            self.first_name.as_str(),
            self.sunet_id.as_str(),
            self.tuition_group.as_str(),
            self.acad_plan.as_str(),
        ];
        if let Some(flag) = &self.cross_program {
            fields.push(flag);
        }
        fields
    }
}

/// Identifies one student within one class, independent of academic plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub class_id: String,
    pub emplid: String,
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    pub sunet_id: String,
}
