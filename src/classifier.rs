//! Filter selection and per-row classification.

use tracing::warn;

use crate::error::{Result, SplitError};
use crate::models::{OutputRecord, SourceRow, BOSP_LABEL};

/// Caller-selected filter labels, split once into the cross-program switch
/// and the tuition group names to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    bosp_requested: bool,
    tuition_labels: Vec<String>,
}

impl FilterSpec {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = FilterSpec::default();
        for label in labels {
            let label = label.into();
            if label == BOSP_LABEL {
                spec.bosp_requested = true;
            } else if !spec.tuition_labels.contains(&label) {
                spec.tuition_labels.push(label);
            }
        }
        spec
    }

    /// Builds a filter after checking each label against the allowed vocabulary.
    ///
    /// With `strict` unset, unknown labels are kept and only warned about.
    pub fn from_selection(labels: &[String], vocabulary: &[String], strict: bool) -> Result<Self> {
        for label in labels {
            if label != BOSP_LABEL && !vocabulary.contains(label) {
                if strict {
                    return Err(SplitError::UnknownFilter {
                        label: label.clone(),
                    });
                }
                warn!(label = %label, "filter label is not in the configured vocabulary");
            }
        }
        Ok(Self::new(labels.iter().cloned()))
    }

    pub fn bosp_requested(&self) -> bool {
        self.bosp_requested
    }

    pub fn tuition_labels(&self) -> &[String] {
        &self.tuition_labels
    }

    pub fn is_empty(&self) -> bool {
        !self.bosp_requested && self.tuition_labels.is_empty()
    }

    /// `bosp_active` is the BOSP switch after accounting for the source schema.
    fn admits(&self, row: &SourceRow, bosp_active: bool, cross_program: bool) -> bool {
        let filter_on = !self.tuition_labels.is_empty();
        (filter_on && self.tuition_labels.contains(&row.tuition_group))
            || (bosp_active && cross_program)
            || (!filter_on && !bosp_active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Excluded,
    Included(OutputRecord),
}

/// Decides whether `row` belongs in the file for `target_class`.
///
/// Fails with `MalformedRow` only for rows that pass the filter but whose
/// name field has no comma.
pub fn classify(
    row: &SourceRow,
    line: u64,
    target_class: &str,
    filter: &FilterSpec,
    has_study_agreement_column: bool,
) -> Result<Classification> {
    if row.class_id != target_class {
        return Ok(Classification::Excluded);
    }

    // Without the column a BOSP selection is ignored entirely.
    let bosp_active = filter.bosp_requested && has_study_agreement_column;
    let cross_program = has_study_agreement_column && row.is_cross_program();
    if !filter.admits(row, bosp_active, cross_program) {
        return Ok(Classification::Excluded);
    }

    let (last_name, first_name) = row
        .last_first_name
        .split_once(',')
        .ok_or_else(|| SplitError::MalformedRow {
            line,
            reason: "name field has no comma".to_string(),
        })?;

    let cross_program = has_study_agreement_column.then(|| {
        if cross_program {
            BOSP_LABEL.to_string()
        } else {
            String::new()
        }
    });

    Ok(Classification::Included(OutputRecord {
        class_id: row.class_id.clone(),
        emplid: row.emplid.clone(),
        email: row.email.clone(),
        last_name: last_name.to_string(),
        first_name: first_name.trim().to_string(),
        sunet_id: row.sunet_id.clone(),
        tuition_group: row.tuition_group.clone(),
        acad_plan: row.acad_plan.clone(),
        cross_program,
    }))
}
