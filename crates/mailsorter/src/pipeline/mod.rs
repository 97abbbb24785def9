//! The batch run: classify every message of the source folders, move it, and
//! store a report.

pub mod context;
pub mod error;
pub mod report;
pub mod runner;

pub use context::{FolderLedger, MessageOutcome, RunLedger, SkipReason};
pub use error::PipelineError;
pub use report::{report_body, report_subject, MessageSummaryRecord, RunOutcome, RunReport};
pub use runner::{run_batch, BatchRunner};
