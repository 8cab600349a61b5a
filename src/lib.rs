//! Splits a class roster export into one filtered, deduplicated CSV file per class.

pub mod classifier;
pub mod dedupe;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod schema;
pub mod source;
pub mod splitter;

pub use classifier::{classify, Classification, FilterSpec};
pub use dedupe::IdentityDeduplicator;
pub use error::{Result, SplitError};
pub use models::{Config, IdentityKey, OutputRecord, SourceRow};
pub use orchestrator::{split, split_with_stamp, ClassFailure, SplitReport, SplitRequest};
pub use schema::Schema;
pub use source::{detect_schema, enumerate_classes, ClassPartition, RosterSource, RowIssue};
pub use splitter::{ClassOutcome, ClassSplitter, RunStamp};
