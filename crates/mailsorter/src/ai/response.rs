//! Parsing of the structured model response.
//!
//! The model is asked to answer with a delimited block:
//!
//! ```text
//! ---START---
//! #ZUSAMMENFASSUNG
//! <one-line summary>
//! #ORDNER
//! <accountId>|<folder path>
//! ---ENDE---
//! ```
//!
//! Parsing is deterministic and never fails: anything missing comes back as an
//! empty string, and callers treat an empty target folder as "no
//! classification".

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const BLOCK_START: &str = "---START---";
pub const BLOCK_END: &str = "---ENDE---";
pub const SUMMARY_MARKER: &str = "#ZUSAMMENFASSUNG";
pub const FOLDER_MARKER: &str = "#ORDNER";

/// Fields extracted from a model answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedModelResponse {
    pub summary: String,
    pub target_folder: String,
}

impl ParsedModelResponse {
    pub fn has_target(&self) -> bool {
        !self.target_folder.is_empty()
    }
}

static RE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s){}(.*?){}",
        regex::escape(BLOCK_START),
        regex::escape(BLOCK_END)
    ))
    .unwrap()
});
static RE_SUMMARY: LazyLock<Regex> = LazyLock::new(|| section_regex(SUMMARY_MARKER));
static RE_FOLDER: LazyLock<Regex> = LazyLock::new(|| section_regex(FOLDER_MARKER));

/// `<marker>`, optional whitespace, a newline, then the value up to a newline or `#`.
fn section_regex(marker: &str) -> Regex {
    Regex::new(&format!(r"{}\s*\n([^\n#]+)", regex::escape(marker))).unwrap()
}

/// Extracts summary and target folder from raw model text.
pub fn parse_response(response: &str) -> ParsedModelResponse {
    let mut result = ParsedModelResponse::default();

    let Some(block) = RE_BLOCK
        .captures(response)
        .and_then(|caps| caps.get(1))
    else {
        debug!("No {}/{} block in model response", BLOCK_START, BLOCK_END);
        return result;
    };
    let content = block.as_str();

    if let Some(caps) = RE_SUMMARY.captures(content) {
        result.summary = caps[1].trim().to_string();
    } else {
        debug!("No summary section in model response");
    }

    if let Some(caps) = RE_FOLDER.captures(content) {
        result.target_folder = caps[1].trim().to_string();
    } else {
        debug!("No folder section in model response");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_block_returns_default() {
        let parsed = parse_response("I think this goes to Work.");
        assert_eq!(parsed, ParsedModelResponse::default());
        assert!(!parsed.has_target());
    }

    #[test]
    fn test_unterminated_block_returns_default() {
        let parsed = parse_response("---START---\n#ZUSAMMENFASSUNG\nHello\n#ORDNER\na|/b\n");
        assert_eq!(parsed, ParsedModelResponse::default());
    }

    #[test]
    fn test_parses_well_formed_block() {
        let parsed = parse_response(
            "---START---\n#ZUSAMMENFASSUNG\nHello\n#ORDNER\nacct1|/Inbox/Sub\n---ENDE---",
        );
        assert_eq!(parsed.summary, "Hello");
        assert_eq!(parsed.target_folder, "acct1|/Inbox/Sub");
    }

    #[test]
    fn test_ignores_text_around_block() {
        let parsed = parse_response(
            "Sure! Here you go:\n---START---\n#ZUSAMMENFASSUNG\n  Invoice from ACME  \n#ORDNER\nme@example.com - /Invoices\n---ENDE---\nAnything else?",
        );
        assert_eq!(parsed.summary, "Invoice from ACME");
        assert_eq!(parsed.target_folder, "me@example.com - /Invoices");
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let parsed = parse_response("---START---\n#ORDNER\nacct|/Work\n---ENDE---");
        assert_eq!(parsed.summary, "");
        assert_eq!(parsed.target_folder, "acct|/Work");

        let parsed = parse_response("---START---\n#ZUSAMMENFASSUNG\nOnly summary\n---ENDE---");
        assert_eq!(parsed.summary, "Only summary");
        assert_eq!(parsed.target_folder, "");
    }

    #[test]
    fn test_skips_blank_lines_after_marker() {
        let parsed = parse_response("---START---\n#ZUSAMMENFASSUNG\n\n\nLater line\n---ENDE---");
        assert_eq!(parsed.summary, "Later line");
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = parse_response(
            "---START---\r\n#ZUSAMMENFASSUNG\r\nHello\r\n#ORDNER\r\nacct|/Work\r\n---ENDE---",
        );
        assert_eq!(parsed.summary, "Hello");
        assert_eq!(parsed.target_folder, "acct|/Work");
    }

    #[test]
    fn test_value_stops_at_hash() {
        let parsed = parse_response("---START---\n#ORDNER\nacct|/C#/Projects\n---ENDE---");
        assert_eq!(parsed.target_folder, "acct|/C");
    }

    #[test]
    fn test_only_first_block_is_used() {
        let parsed = parse_response(
            "---START---\n#ORDNER\nfirst|/A\n---ENDE---\n---START---\n#ORDNER\nsecond|/B\n---ENDE---",
        );
        assert_eq!(parsed.target_folder, "first|/A");
    }
}
