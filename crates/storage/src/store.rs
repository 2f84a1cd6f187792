//! Storage collaborator contract.
//!
//! [`EventStore`] is everything ingestion and analytics need from durable
//! storage. Reads return owned copies; nothing a query holds is written back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use chronologicon_core::time::iso_millis;
use chronologicon_core::{EventId, HistoricalEvent};

use crate::error::StoreError;
use crate::search::{SearchPage, SearchQuery};

/// Projection used to build the influence graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphRow {
    pub event_id: EventId,
    pub event_name: String,
    pub parent_event_id: Option<EventId>,
    pub duration_minutes: i64,
    #[serde(with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_date: DateTime<Utc>,
}

impl From<&HistoricalEvent> for GraphRow {
    fn from(e: &HistoricalEvent) -> Self {
        Self {
            event_id: e.event_id.clone(),
            event_name: e.event_name.clone(),
            parent_event_id: e.parent_event_id.clone(),
            duration_minutes: e.duration_minutes,
            start_date: e.start_date,
            end_date: e.end_date,
        }
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Atomically insert `events`, skipping ids that already exist.
    ///
    /// Either every new row lands or none does. Returns the number of rows
    /// actually inserted (duplicates excluded).
    async fn insert_batch(&self, events: &[HistoricalEvent]) -> Result<usize, StoreError>;

    /// Point lookup.
    async fn get(&self, event_id: &str) -> Result<Option<HistoricalEvent>, StoreError>;

    /// `root` followed by all of its descendants, breadth-first.
    /// Empty when `root` is unknown.
    async fn subtree(&self, root: &str) -> Result<Vec<HistoricalEvent>, StoreError>;

    /// `leaf` followed by its parent, grandparent, ... up to the first
    /// unresolvable parent reference. Empty when `leaf` is unknown.
    async fn ancestors(&self, leaf: &str) -> Result<Vec<HistoricalEvent>, StoreError>;

    /// Events whose interval touches `[start, end]`, ordered by start.
    async fn events_intersecting(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalEvent>, StoreError>;

    /// Events lying entirely inside `[start, end]`, ordered by start.
    async fn events_within(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalEvent>, StoreError>;

    /// Unfiltered projection of every event for graph construction.
    async fn graph_rows(&self) -> Result<Vec<GraphRow>, StoreError>;

    /// Filtered, sorted, paginated listing.
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, StoreError>;

    /// Number of stored events.
    async fn len(&self) -> Result<usize, StoreError>;
}
