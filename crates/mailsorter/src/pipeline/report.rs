//! The run report: the draft stored into the summary folder and the outcome
//! returned to the caller.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::ai::ParsedModelResponse;

const SEPARATOR: &str = "-----------------";

/// One successfully moved message, as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummaryRecord {
    pub from: String,
    pub subject: String,
    pub parsed: ParsedModelResponse,
    /// `<account display name> - <folder path>`
    pub moved_to: String,
}

/// What a run returns to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub success: bool,
    pub processed_count: usize,
    pub error_count: usize,
}

impl RunOutcome {
    pub fn new(processed_count: usize, error_count: usize) -> Self {
        Self {
            success: error_count == 0,
            processed_count,
            error_count,
        }
    }
}

/// The finished report of one run.
///
/// `errors` may hold more entries than the body lists: failures while storing
/// the report are appended after the body was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    pub subject: String,
    pub body: String,
    pub errors: Vec<String>,
    pub outcome: RunOutcome,
}

pub fn report_subject(at: DateTime<Local>) -> String {
    format!(
        "Email processing report from {} {}",
        at.format("%Y-%m-%d"),
        at.format("%H:%M:%S")
    )
}

pub fn report_body(summaries: &[MessageSummaryRecord], errors: &[String]) -> String {
    let mut body = String::from("Processing report:\n\n");

    if summaries.is_empty() {
        body.push_str("No emails were processed.\n\n");
    } else {
        body.push_str("Successfully processed emails:\n\n");
        for summary in summaries {
            body.push_str(&format!("From: {}\n", summary.from));
            body.push_str(&format!("Subject: {}\n", summary.subject));
            body.push_str(&format!("Summary: {}\n", summary.parsed.summary));
            body.push_str(&format!("Moved to: {}\n\n", summary.moved_to));
            body.push_str(SEPARATOR);
            body.push_str("\n\n");
        }
    }

    if !errors.is_empty() {
        body.push_str("Errors during processing:\n\n");
        for error in errors {
            body.push_str(&format!("- {}\n", error));
        }
        body.push('\n');
        body.push_str(SEPARATOR);
        body.push_str("\n\n");
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> MessageSummaryRecord {
        MessageSummaryRecord {
            from: "Alice <alice@example.com>".to_string(),
            subject: "Invoice".to_string(),
            parsed: ParsedModelResponse {
                summary: "An invoice".to_string(),
                target_folder: "acct1|/Invoices".to_string(),
            },
            moved_to: "me@example.com - /Invoices".to_string(),
        }
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(
            report_body(&[], &[]),
            "Processing report:\n\nNo emails were processed.\n\n"
        );
    }

    #[test]
    fn test_report_with_summaries_and_errors() {
        let body = report_body(&[record()], &["No matching folder found for: Hi".to_string()]);
        assert_eq!(
            body,
            "Processing report:\n\n\
             Successfully processed emails:\n\n\
             From: Alice <alice@example.com>\n\
             Subject: Invoice\n\
             Summary: An invoice\n\
             Moved to: me@example.com - /Invoices\n\n\
             -----------------\n\n\
             Errors during processing:\n\n\
             - No matching folder found for: Hi\n\
             \n-----------------\n\n"
        );
    }

    #[test]
    fn test_subject_format() {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(
            report_subject(at),
            "Email processing report from 2026-03-01 09:05:07"
        );
    }

    #[test]
    fn test_outcome_success_flag() {
        assert!(RunOutcome::new(3, 0).success);
        assert!(!RunOutcome::new(3, 1).success);
    }
}
