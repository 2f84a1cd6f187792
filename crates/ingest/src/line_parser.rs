//! Parse one pipe-delimited record into a [`HistoricalEvent`].
//!
//! Record layout: `event_id|event_name|start_date|end_date|parent_id_or_NULL|description`.
//! Problems come back as [`LineDiagnostic`] values so the caller can keep
//! reading; nothing in here fails the stream.

use std::fmt;

use thiserror::Error;

use chronologicon_core::time::parse_timestamp;
use chronologicon_core::{is_uuid_shaped, HistoricalEvent};

/// Characters of the raw line quoted in a malformed-entry diagnostic.
const PREVIEW_CHARS: usize = 120;

/// What is wrong with a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIssue {
    #[error("Malformed entry (expected 6 fields, got {got}): '{preview}'")]
    Malformed { got: usize, preview: String },

    #[error("Invalid UUID for event_id: '{0}'")]
    InvalidEventId(String),

    #[error("Missing event_name for event '{event_id}'")]
    MissingName { event_id: String },

    #[error("Invalid date format for {field} of event '{event_id}': '{value}'")]
    InvalidDate {
        field: &'static str,
        event_id: String,
        value: String,
    },

    #[error("end_date is before start_date for event '{event_id}'")]
    EndBeforeStart { event_id: String },

    #[error("Invalid UUID for parent_event_id: '{0}'")]
    InvalidParentId(String),
}

/// A [`ParseIssue`] pinned to its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiagnostic {
    pub line_number: u64,
    pub issue: ParseIssue,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line_number, self.issue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Blank line. Not an event, not an error.
    Skip,
    Event(HistoricalEvent),
    Invalid(LineDiagnostic),
}

/// Parse a single raw line. `line_number` is 1-based and only used for diagnostics.
pub fn parse_line(raw: &str, line_number: u64) -> ParseOutcome {
    if raw.trim().is_empty() {
        return ParseOutcome::Skip;
    }
    match parse_fields(raw) {
        Ok(event) => ParseOutcome::Event(event),
        Err(issue) => ParseOutcome::Invalid(LineDiagnostic { line_number, issue }),
    }
}

fn parse_fields(raw: &str) -> Result<HistoricalEvent, ParseIssue> {
    let parts: Vec<&str> = raw.split('|').map(str::trim).collect();
    let [event_id, event_name, start_raw, end_raw, parent_raw, description] = parts[..] else {
        return Err(ParseIssue::Malformed {
            got: parts.len(),
            preview: raw.chars().take(PREVIEW_CHARS).collect(),
        });
    };

    if !is_uuid_shaped(event_id) {
        return Err(ParseIssue::InvalidEventId(event_id.to_string()));
    }

    if event_name.is_empty() {
        return Err(ParseIssue::MissingName {
            event_id: event_id.to_string(),
        });
    }

    let invalid_date = |field: &'static str, value: &str| ParseIssue::InvalidDate {
        field,
        event_id: event_id.to_string(),
        value: value.to_string(),
    };
    let start = parse_timestamp(start_raw).map_err(|_| invalid_date("start_date", start_raw))?;
    let end = parse_timestamp(end_raw).map_err(|_| invalid_date("end_date", end_raw))?;

    if end < start {
        return Err(ParseIssue::EndBeforeStart {
            event_id: event_id.to_string(),
        });
    }

    let parent = if parent_raw.is_empty() || parent_raw.eq_ignore_ascii_case("NULL") {
        None
    } else if is_uuid_shaped(parent_raw) {
        Some(parent_raw)
    } else {
        return Err(ParseIssue::InvalidParentId(parent_raw.to_string()));
    };

    let mut event = HistoricalEvent::new(event_id, event_name, start, end);
    if let Some(parent) = parent {
        event = event.with_parent(parent);
    }
    if !description.is_empty() {
        event = event.with_description(description);
    }
    Ok(event)
}
