//! Read-then-compute facade over an [`EventStore`].
//!
//! Each call takes one snapshot read from the store and runs the algorithm
//! on the owned result, so no store lock is held while computing.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use chronologicon_graph::EventGraph;
use chronologicon_storage::{EventStore, StoreError};

use crate::algorithms::gaps::{find_largest_gap, GapReport};
use crate::algorithms::influence::{find_path, InfluencePath};
use crate::algorithms::overlap::{find_overlaps, OverlapPair};

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), InsightError> {
    if start > end {
        return Err(InsightError::InvalidRange { start, end });
    }
    Ok(())
}

#[derive(Clone)]
pub struct InsightService {
    store: Arc<dyn EventStore>,
}

impl InsightService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Intersecting pairs among events fully inside `[start, end]`.
    pub async fn overlapping_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OverlapPair>, InsightError> {
        check_range(start, end)?;
        let events = self.store.events_within(start, end).await?;

        let t = Instant::now();
        let pairs = find_overlaps(&events, start, end);
        debug!(
            events = events.len(),
            pairs = pairs.len(),
            elapsed_ms = t.elapsed().as_millis() as u64,
            "overlap scan done"
        );
        Ok(pairs)
    }

    /// Largest uncovered span of `[start, end]`.
    pub async fn temporal_gaps(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<GapReport, InsightError> {
        check_range(start, end)?;
        let events = self.store.events_intersecting(start, end).await?;

        let report = find_largest_gap(&events, start, end);
        debug!(
            events = events.len(),
            found = report.largest_gap.is_some(),
            "gap sweep done"
        );
        Ok(report)
    }

    /// Cheapest parent/child chain from `source` to `target`.
    pub async fn event_influence(
        &self,
        source: &str,
        target: &str,
    ) -> Result<InfluencePath, InsightError> {
        let rows = self.store.graph_rows().await?;

        let t = Instant::now();
        let graph = EventGraph::build(&rows);
        let path = find_path(&graph, source, target);
        info!(
            source,
            target,
            outcome = ?path.outcome,
            hops = path.shortest_path.len(),
            cost = path.total_duration_minutes,
            nodes = graph.node_count(),
            elapsed_ms = t.elapsed().as_millis() as u64,
            "influence path computed"
        );
        Ok(path)
    }
}
