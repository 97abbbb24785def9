//! Accumulators of a batch run.
//!
//! Each message step returns a [`MessageOutcome`], the folder loop folds them
//! into a [`FolderLedger`], and the runner merges ledgers into the
//! [`RunLedger`] that the report is built from.

use super::report::MessageSummaryRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyProcessed,
    Read,
}

/// Result of handling one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Moved(MessageSummaryRecord),
    /// Moved on the host, but the processed set could not be updated.
    MovedUnrecorded {
        summary: MessageSummaryRecord,
        error: String,
    },
    Skipped(SkipReason),
    Failed(String),
}

/// Outcomes of one source folder.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderLedger {
    pub summaries: Vec<MessageSummaryRecord>,
    pub errors: Vec<String>,
    pub skipped: usize,
}

impl FolderLedger {
    pub fn record(&mut self, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Moved(summary) => self.summaries.push(summary),
            MessageOutcome::MovedUnrecorded { summary, error } => {
                self.summaries.push(summary);
                self.errors.push(error);
            }
            MessageOutcome::Skipped(_) => self.skipped += 1,
            MessageOutcome::Failed(error) => self.errors.push(error),
        }
    }

    /// Ledger of a folder that could not be processed at all.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }
}

/// Everything collected over a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunLedger {
    pub summaries: Vec<MessageSummaryRecord>,
    pub errors: Vec<String>,
    pub skipped: usize,
}

impl RunLedger {
    pub fn merge(&mut self, folder: FolderLedger) {
        self.summaries.extend(folder.summaries);
        self.errors.extend(folder.errors);
        self.skipped += folder.skipped;
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn processed_count(&self) -> usize {
        self.summaries.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
