use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::{iso_millis, minutes_between};

/// Opaque event identifier. Ingested ids are UUID-shaped; the analytics
/// layer treats them as plain strings.
pub type EventId = String;

/// True for the canonical hyphenated 8-4-4-4-12 hex form only.
pub fn is_uuid_shaped(s: &str) -> bool {
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}

/// Ingestion provenance attached to every stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub source_file: String,
    pub line_number: u64,
    #[serde(with = "iso_millis")]
    pub parsed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub event_id: EventId,
    pub event_name: String,
    pub description: Option<String>,
    #[serde(with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_date: DateTime<Utc>,
    /// Always `round((end_date - start_date) / 1min)`; set by [`HistoricalEvent::new`].
    pub duration_minutes: i64,
    pub parent_event_id: Option<EventId>,
    pub metadata: Option<EventMetadata>,
}

impl HistoricalEvent {
    /// Build an event, deriving `duration_minutes` from the interval.
    ///
    /// Callers are responsible for `end_date >= start_date`; the line parser
    /// rejects records that violate it before reaching here.
    pub fn new(
        event_id: impl Into<EventId>,
        event_name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_name: event_name.into(),
            description: None,
            start_date,
            end_date,
            duration_minutes: minutes_between(&start_date, &end_date),
            parent_event_id: None,
            metadata: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<EventId>) -> Self {
        self.parent_event_id = Some(parent.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Closed-interval intersection with `[start, end]`.
    pub fn intersects(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
        self.start_date <= *end && self.end_date >= *start
    }

    /// Whole interval lies inside `[start, end]`.
    pub fn within(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
        self.start_date >= *start && self.end_date <= *end
    }
}
