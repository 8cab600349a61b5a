//! Drives a whole split run: one directory, one task per class.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::classifier::FilterSpec;
use crate::error::{Result, SplitError};
use crate::source::{RosterSource, RowIssue};
use crate::splitter::{create_run_directory, ClassOutcome, ClassSplitter, RunStamp};

/// Everything a caller supplies for one run.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub filter: FilterSpec,
    /// Cap on concurrently written classes; `None` uses the core count.
    pub workers: Option<usize>,
}

/// A class whose file could not be produced.
#[derive(Debug)]
pub struct ClassFailure {
    pub class_id: String,
    pub error: String,
}

/// Aggregate result of a run that got as far as creating its directory.
#[derive(Debug)]
pub struct SplitReport {
    pub directory: PathBuf,
    pub class_count: usize,
    pub outcomes: Vec<ClassOutcome>,
    pub failures: Vec<ClassFailure>,
    /// Rows skipped while reading the source or normalizing names.
    pub malformed_rows: Vec<RowIssue>,
}

impl SplitReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn files_written(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcome_for(&self, class_id: &str) -> Option<&ClassOutcome> {
        self.outcomes.iter().find(|o| o.class_id == class_id)
    }
}

/// Splits the roster with a freshly captured timestamp.
pub async fn split(request: SplitRequest) -> Result<SplitReport> {
    split_with_stamp(request, RunStamp::now()).await
}

/// Splits the roster using a caller-provided timestamp.
///
/// Fails only when the source cannot be read or the run directory cannot be
/// created; per-class write failures end up in the report.
pub async fn split_with_stamp(request: SplitRequest, stamp: RunStamp) -> Result<SplitReport> {
    info!(source = %request.source.display(), "operating on roster");
    info!(
        bosp = request.filter.bosp_requested(),
        tuition_groups = ?request.filter.tuition_labels(),
        "filtering"
    );

    let source_path = request.source.clone();
    let partition = tokio::task::spawn_blocking(move || {
        RosterSource::open(&source_path).and_then(RosterSource::partition)
    })
    .await
    .map_err(|e| SplitError::unreadable(&request.source, e))?
    .inspect_err(|e| error!(error = %e, "source roster unreadable"))?;

    let directory = create_run_directory(&request.destination, &stamp)
        .inspect_err(|e| error!(error = %e, "cannot create run directory"))?;
    info!(directory = %directory.display(), "classes folder created");

    let splitter = Arc::new(ClassSplitter {
        schema: partition.schema,
        filter: request.filter,
        directory: directory.clone(),
        date: stamp.date,
    });

    let workers = request
        .workers
        .filter(|&n| n > 0)
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1);
    let permits = Arc::new(Semaphore::new(workers));

    let class_count = partition.len();
    let mut malformed_rows = partition.issues.clone();
    let mut failures = Vec::new();
    // Distinct ids can share a file name once spaces are dropped; the first id
    // in sorted order keeps the file.
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();
    let mut tasks = JoinSet::new();
    for (class_id, rows) in partition.into_classes() {
        let path = splitter.output_path(&class_id);
        if let Some(owner) = claimed.get(&path) {
            warn!(class = %class_id, other = %owner, "output file name collides");
            failures.push(ClassFailure {
                error: format!("output file name collides with {}", owner),
                class_id,
            });
            continue;
        }
        claimed.insert(path, class_id.clone());

        let splitter = Arc::clone(&splitter);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            // The semaphore is never closed, so acquiring cannot fail.
            let _permit = permits.acquire_owned().await.ok();
            let task_class = class_id.clone();
            let written =
                tokio::task::spawn_blocking(move || splitter.write_class(&task_class, &rows))
                    .await;
            (class_id, written)
        });
    }

    let mut outcomes = Vec::with_capacity(class_count);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(Ok(outcome)))) => {
                malformed_rows.extend(outcome.issues.iter().cloned());
                outcomes.push(outcome);
            }
            Ok((class_id, Ok(Err(e)))) => {
                warn!(class = %class_id, error = %e, "class file failed");
                failures.push(ClassFailure {
                    class_id,
                    error: e.to_string(),
                });
            }
            Ok((class_id, Err(e))) => {
                warn!(class = %class_id, error = %e, "class task panicked");
                failures.push(ClassFailure {
                    class_id,
                    error: format!("task failed: {}", e),
                });
            }
            Err(e) => {
                warn!(error = %e, "class task panicked");
                failures.push(ClassFailure {
                    class_id: String::from("<unknown>"),
                    error: format!("task failed: {}", e),
                });
            }
        }
    }

    outcomes.sort_by(|a, b| a.class_id.cmp(&b.class_id));
    failures.sort_by(|a, b| a.class_id.cmp(&b.class_id));
    malformed_rows.sort_by_key(|issue| issue.line);

    info!(
        classes = class_count,
        written = outcomes.len(),
        failed = failures.len(),
        "split complete"
    );
    Ok(SplitReport {
        directory,
        class_count,
        outcomes,
        failures,
        malformed_rows,
    })
}
